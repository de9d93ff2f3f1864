//! System prompts for the LLM-backed collaborators. Each prompt pins the
//! exact JSON shape the matching parser in [`crate::parser`] expects.

fn pivot_schema() -> String {
    let example = serde_json::json!({
        "title": "<product title>",
        "brand": "<brand name or null>",
        "attributes": {"<spec name>": "<spec value>"},
        "condition": "new|used|unknown",
        "price": "<listed price as decimal string, or null>",
        "currency": "<ISO currency code, default MXN>"
    });
    serde_json::to_string_pretty(&example).unwrap_or_default()
}

pub fn extraction_system_prompt() -> String {
    format!(
        "You extract product specifications from marketplace listings.\n\n\
         The user message contains either a product page excerpt or a free-text \
         product description. Identify the product and normalize its technical \
         attributes into short key/value pairs (e.g. \"power\": \"10W\", \
         \"size\": \"5 inch\"). Detect the brand when one is present; set it to \
         null when you cannot identify one. Never invent attributes that are \
         not supported by the input.\n\n\
         You MUST respond with ONLY a JSON object matching this schema:\n{}",
        pivot_schema()
    )
}

pub fn term_system_prompt() -> String {
    let example = serde_json::json!({
        "primary_query": "<best search query>",
        "fallback_queries": ["<second choice>", "<third choice>"],
        "reasoning": "<one short paragraph>"
    });
    format!(
        "You derive marketplace search queries for price benchmarking.\n\n\
         Given a pivot product (title, brand, attributes), produce search terms \
         that find FUNCTIONALLY EQUIVALENT listings from ANY brand. The whole \
         point is brand-agnostic search: the queries MUST NOT contain the \
         pivot's brand name or model number. Build them from the product \
         category and its technical attributes instead (e.g. for a branded 10W \
         5-inch speaker: \"bocina bluetooth 10w 5 pulgadas\").\n\n\
         Order fallback queries from most to least specific. Two or three \
         fallbacks are enough.\n\n\
         You MUST respond with ONLY a JSON object matching this schema:\n{}",
        serde_json::to_string_pretty(&example).unwrap_or_default()
    )
}

pub fn classify_system_prompt() -> String {
    let example = serde_json::json!({
        "verdicts": [{
            "listing_id": "<id from input>",
            "classification": "comparable|accessory|bundle|irrelevant",
            "confidence": "<0.0 to 1.0>",
            "reason": "<brief reason>"
        }]
    });
    format!(
        "You classify e-commerce listings against a pivot product.\n\n\
         For each OFFER in the user message, decide:\n\
         - comparable: the same or a functionally equivalent product\n\
         - accessory: a case, cable, charger, stand, screen protector, \
         replacement part\n\
         - bundle: multiple items, a kit, or \"producto + extra\"\n\
         - irrelevant: a different product altogether\n\n\
         Be strict: only mark comparable when it is truly equivalent. \
         Examples for a pivot \"Sony WH-1000XM5\":\n\
         - \"Sony WH-1000XM5 Negro\" -> comparable (color variant)\n\
         - \"Sony WH-1000XM4\" -> irrelevant (different model)\n\
         - \"Funda para Sony WH-1000XM5\" -> accessory\n\
         - \"Sony WH-1000XM5 + Cable\" -> bundle\n\n\
         Return one verdict per offer, keyed by the offer's listing_id. \
         You MUST respond with ONLY a JSON object matching this schema:\n{}",
        serde_json::to_string_pretty(&example).unwrap_or_default()
    )
}

pub fn recommend_system_prompt() -> String {
    let example = serde_json::json!({
        "recommended_price": "<decimal string>",
        "strategy": "aggressive|competitive|premium",
        "reasoning": "<short market analysis>",
        "alternatives": {
            "aggressive": "<decimal string>",
            "competitive": "<decimal string>",
            "premium": "<decimal string>"
        }
    });
    format!(
        "You recommend a listing price from competitor price statistics.\n\n\
         The user message carries robust statistics over comparable listings \
         (quartiles, median, IQR, retained price range after outlier removal) \
         and a short summary of the comparables. Choose a strategy:\n\
         - A narrow IQR relative to the median means a competitive market: \
         price at the median (strategy \"competitive\").\n\
         - A wide IQR means a dispersed market: price near the lower quartile \
         (strategy \"aggressive\") to win on value, or near the upper quartile \
         (strategy \"premium\") only when the comparables justify it.\n\n\
         The recommended price MUST fall inside the retained [min, max] range; \
         also provide one alternative price per strategy.\n\n\
         All decimal values are quoted strings. You MUST respond with ONLY a \
         JSON object matching this schema:\n{}",
        serde_json::to_string_pretty(&example).unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_pins_schema_fields() {
        let prompt = extraction_system_prompt();
        for field in ["title", "brand", "attributes", "condition", "currency"] {
            assert!(prompt.contains(field), "missing field: {field}");
        }
    }

    #[test]
    fn term_prompt_forbids_brand_leakage() {
        let prompt = term_system_prompt();
        assert!(prompt.contains("MUST NOT contain the pivot's brand"));
        assert!(prompt.contains("primary_query"));
        assert!(prompt.contains("fallback_queries"));
    }

    #[test]
    fn classify_prompt_contains_all_classes_and_examples() {
        let prompt = classify_system_prompt();
        for class in ["comparable", "accessory", "bundle", "irrelevant"] {
            assert!(prompt.contains(class), "missing class: {class}");
        }
        assert!(prompt.contains("WH-1000XM5"));
        assert!(prompt.contains("listing_id"));
    }

    #[test]
    fn recommend_prompt_contains_strategies() {
        let prompt = recommend_system_prompt();
        for strategy in ["aggressive", "competitive", "premium"] {
            assert!(prompt.contains(strategy), "missing strategy: {strategy}");
        }
        assert!(prompt.contains("recommended_price"));
    }
}
