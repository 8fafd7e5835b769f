//! JSON-LD synthesis
//!
//! Each page type maps to one schema.org generator. Generated objects are
//! plain `serde_json` values so caller-supplied structured data can be merged
//! on top key by key.

use crate::config::{PageRule, PageType, SchemaType};
use crate::geo::extract::{self, PageSignals};
use serde_json::{json, Map, Value};

pub const SCHEMA_CONTEXT: &str = "https://schema.org";

/// Inputs shared by every generator
#[derive(Debug)]
pub struct SchemaInput<'a> {
    pub html: &'a str,
    pub url: &'a str,
    pub signals: &'a PageSignals,
}

/// Returns the generator used for a page type when no rule picks one
pub fn schema_type_for(page_type: PageType) -> SchemaType {
    match page_type {
        PageType::Product => SchemaType::Product,
        PageType::Article => SchemaType::Article,
        PageType::Docs => SchemaType::TechArticle,
        PageType::Faq => SchemaType::FaqPage,
        PageType::HowTo => SchemaType::HowTo,
        PageType::Pricing | PageType::Comparison | PageType::Generic => SchemaType::WebPage,
    }
}

/// Builds the JSON-LD objects for a page
///
/// A rule's `schemaTypes` replaces the page-type default and yields one object
/// per listed type. The rule's custom structured data is merged into the first
/// object, winning over generated keys.
pub fn synthesize(page_type: PageType, input: &SchemaInput<'_>, rule: Option<&PageRule>) -> Vec<Value> {
    let mut types: Vec<SchemaType> = Vec::new();
    match rule.and_then(|r| r.schema_types.as_ref()) {
        Some(listed) if !listed.is_empty() => {
            for schema_type in listed {
                if !types.contains(schema_type) {
                    types.push(*schema_type);
                }
            }
        }
        _ => types.push(schema_type_for(page_type)),
    }

    let mut schemas: Vec<Value> = types
        .into_iter()
        .map(|schema_type| generate(schema_type, input))
        .collect();

    if let (Some(first), Some(custom)) = (
        schemas.first_mut(),
        rule.and_then(|r| r.custom_structured_data.as_ref()),
    ) {
        merge_custom(first, custom);
    }

    schemas
}

/// Runs one generator
///
/// `FAQPage` without question pairs and `HowTo` without steps degrade to
/// `WebPage`.
pub fn generate(schema_type: SchemaType, input: &SchemaInput<'_>) -> Value {
    match schema_type {
        SchemaType::Product => product(input),
        SchemaType::Article => article(input),
        SchemaType::TechArticle => tech_article(input),
        SchemaType::FaqPage => faq_page(input).unwrap_or_else(|| web_page(input)),
        SchemaType::HowTo => how_to(input).unwrap_or_else(|| web_page(input)),
        SchemaType::WebPage => web_page(input),
    }
}

fn base(schema_type: SchemaType) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("@context".to_string(), json!(SCHEMA_CONTEXT));
    map.insert("@type".to_string(), json!(schema_type.as_str()));
    map
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value));
    }
}

fn product(input: &SchemaInput<'_>) -> Value {
    let mut map = base(SchemaType::Product);
    map.insert("name".to_string(), json!(input.signals.resolved_title()));
    insert_opt(&mut map, "description", input.signals.resolved_description());
    map.insert("url".to_string(), json!(input.url));
    insert_opt(&mut map, "image", input.signals.og_image.clone());

    if let Some(price) = extract::extract_prices(input.html).first() {
        let amount: String = price.chars().filter(|c| *c != '$' && *c != ',').collect();
        map.insert(
            "offers".to_string(),
            json!({
                "@type": "Offer",
                "price": amount,
                "priceCurrency": "USD",
            }),
        );
    }

    Value::Object(map)
}

fn article(input: &SchemaInput<'_>) -> Value {
    let mut map = base(SchemaType::Article);
    map.insert("headline".to_string(), json!(input.signals.resolved_title()));
    insert_opt(&mut map, "description", input.signals.resolved_description());
    map.insert("url".to_string(), json!(input.url));
    insert_opt(&mut map, "image", input.signals.og_image.clone());
    insert_opt(&mut map, "datePublished", input.signals.published_time.clone());
    Value::Object(map)
}

fn tech_article(input: &SchemaInput<'_>) -> Value {
    let mut map = base(SchemaType::TechArticle);
    map.insert("headline".to_string(), json!(input.signals.resolved_title()));
    insert_opt(&mut map, "description", input.signals.resolved_description());
    map.insert("url".to_string(), json!(input.url));
    Value::Object(map)
}

fn faq_page(input: &SchemaInput<'_>) -> Option<Value> {
    let pairs = extract::extract_faq_pairs(input.html);
    if pairs.is_empty() {
        return None;
    }

    let questions: Vec<Value> = pairs
        .into_iter()
        .map(|pair| {
            json!({
                "@type": "Question",
                "name": pair.question,
                "acceptedAnswer": {
                    "@type": "Answer",
                    "text": pair.answer,
                },
            })
        })
        .collect();

    let mut map = base(SchemaType::FaqPage);
    map.insert("name".to_string(), json!(input.signals.resolved_title()));
    map.insert("url".to_string(), json!(input.url));
    map.insert("mainEntity".to_string(), Value::Array(questions));
    Some(Value::Object(map))
}

fn how_to(input: &SchemaInput<'_>) -> Option<Value> {
    let steps = extract::extract_ordered_list_steps(input.html);
    if steps.is_empty() {
        return None;
    }

    let steps: Vec<Value> = steps
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            json!({
                "@type": "HowToStep",
                "position": i + 1,
                "text": text,
            })
        })
        .collect();

    let mut map = base(SchemaType::HowTo);
    map.insert("name".to_string(), json!(input.signals.resolved_title()));
    insert_opt(&mut map, "description", input.signals.resolved_description());
    map.insert("url".to_string(), json!(input.url));
    map.insert("step".to_string(), Value::Array(steps));
    Some(Value::Object(map))
}

fn web_page(input: &SchemaInput<'_>) -> Value {
    let mut map = base(SchemaType::WebPage);
    map.insert("name".to_string(), json!(input.signals.resolved_title()));
    insert_opt(&mut map, "description", input.signals.resolved_description());
    map.insert("url".to_string(), json!(input.url));
    Value::Object(map)
}

/// Shallow-merges custom fields into a generated object
///
/// Custom `@context` must be a string and custom `@type` a non-empty string
/// or array of strings; otherwise the whole custom object is ignored.
fn merge_custom(schema: &mut Value, custom: &Map<String, Value>) {
    if let Err(reason) = check_custom(custom) {
        tracing::warn!(reason, "Ignoring invalid custom structured data");
        return;
    }

    if let Value::Object(map) = schema {
        for (key, value) in custom {
            map.insert(key.clone(), value.clone());
        }
    }
}

fn check_custom(custom: &Map<String, Value>) -> Result<(), &'static str> {
    match custom.get("@context") {
        None | Some(Value::String(_)) => {}
        Some(_) => return Err("@context must be a string"),
    }

    match custom.get("@type") {
        None => Ok(()),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(()),
        Some(Value::Array(items))
            if !items.is_empty()
                && items
                    .iter()
                    .all(|item| matches!(item, Value::String(s) if !s.trim().is_empty())) =>
        {
            Ok(())
        }
        Some(_) => Err("@type must be a non-empty string or list of strings"),
    }
}
