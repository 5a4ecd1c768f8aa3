use serde_json::{ json, Map, Value };

use super::{
    Catalog,
    COL_BRAND,
    COL_DESCRIPTION,
    COL_GRAPHICS,
    COL_MODEL_NAME,
    COL_PERSONA,
    COL_PRICE,
    COL_RAM_SIZE,
    COL_SPEC_RATINGS,
};
use crate::models::laptop::{ Laptop, Persona };
use crate::tools::outcome::ToolOutcome;

pub const NOT_LOADED_MESSAGE: &str = "Laptop data not loaded or is empty.";
pub const PERSONA_MISSING_MESSAGE: &str = "Persona data is missing.";
pub const FAREWELL_MESSAGE: &str =
    "Okay, ending the conversation. If you need help again, just ask. Goodbye!";
pub const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub personas: Vec<Persona>,
}

fn opt(value: &Option<String>) -> Value {
    value.as_deref().map(Value::from).unwrap_or(Value::Null)
}

/// Every column of the record, empty cells as `null`.
pub fn laptop_record(laptop: &Laptop) -> Value {
    let mut record: Map<String, Value> = laptop.attributes
        .iter()
        .map(|(k, v)| (k.clone(), opt(v)))
        .collect();
    record.insert(COL_BRAND.into(), opt(&laptop.brand));
    record.insert(COL_MODEL_NAME.into(), opt(&laptop.model_name));
    record.insert(COL_PRICE.into(), json!(laptop.price));
    record.insert(COL_RAM_SIZE.into(), opt(&laptop.ram_size));
    record.insert(COL_GRAPHICS.into(), opt(&laptop.graphics_processor));
    record.insert(COL_DESCRIPTION.into(), opt(&laptop.description));
    record.insert(
        COL_SPEC_RATINGS.into(),
        laptop.specification_ratings
            .as_ref()
            .and_then(|r| serde_json::to_value(r).ok())
            .unwrap_or_else(|| json!({}))
    );
    record.insert(COL_PERSONA.into(), json!(laptop.persona));
    Value::Object(record)
}

fn laptop_summary(laptop: &Laptop) -> Value {
    json!({
        COL_BRAND: opt(&laptop.brand),
        COL_MODEL_NAME: opt(&laptop.model_name),
        COL_PRICE: laptop.price,
        COL_RAM_SIZE: opt(&laptop.ram_size),
        COL_GRAPHICS: opt(&laptop.graphics_processor),
        COL_PERSONA: laptop.persona,
        COL_DESCRIPTION: opt(&laptop.description),
    })
}

/// First laptop whose model name contains `model_name`, ignoring case.
pub fn get_laptop_info(catalog: &Catalog, model_name: &str) -> ToolOutcome {
    if !catalog.is_loaded() {
        return ToolOutcome::error(NOT_LOADED_MESSAGE);
    }

    let needle = model_name.to_lowercase();
    match catalog.laptops().iter().find(|l| l.matches_model(&needle)) {
        Some(laptop) => ToolOutcome::Success {
            count: None,
            data: laptop_record(laptop),
        },
        None => ToolOutcome::NotFound {
            message: format!(
                "Sorry, I couldn't find information for a laptop model like '{}'.",
                model_name
            ),
        },
    }
}

pub fn recommend_laptops_by_criteria(catalog: &Catalog, criteria: &Criteria) -> ToolOutcome {
    if !catalog.is_loaded() {
        return ToolOutcome::error(NOT_LOADED_MESSAGE);
    }
    if !criteria.personas.is_empty() && !catalog.has_personas() {
        return ToolOutcome::error(PERSONA_MISSING_MESSAGE);
    }

    let matches: Vec<&Laptop> = catalog
        .laptops()
        .iter()
        .filter(|l| criteria.budget_min.map_or(true, |min| l.price >= min))
        .filter(|l| criteria.budget_max.map_or(true, |max| l.price <= max))
        .filter(|l| criteria.personas.is_empty() || l.matches_any_persona(&criteria.personas))
        .collect();

    if matches.is_empty() {
        return ToolOutcome::NotFound {
            message: "Sorry, no laptops found matching your criteria. You might want to broaden your search.".into(),
        };
    }

    let data = matches
        .iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|l| laptop_summary(l))
        .collect::<Vec<_>>();
    ToolOutcome::Success {
        count: Some(matches.len()),
        data: Value::Array(data),
    }
}

pub fn end_conversation() -> ToolOutcome {
    ToolOutcome::Ended {
        message: FAREWELL_MESSAGE.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn laptop(model: &str, price: f64, persona: Vec<Persona>) -> Laptop {
        Laptop {
            brand: Some("Acme".into()),
            model_name: Some(model.into()),
            price,
            ram_size: Some("16GB".into()),
            graphics_processor: None,
            description: Some(format!("{} description", model)),
            specification_ratings: None,
            persona,
            attributes: BTreeMap::from([("Laptop Weight".to_string(), None)]),
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                laptop("Inspiron 15", 35000.0, vec![Persona::Student, Persona::BudgetConscious]),
                laptop("ROG Strix G16", 120000.0, vec![Persona::Gamer]),
                laptop("Inspiron 14 Plus", 70000.0, vec![Persona::Developer]),
                laptop("TUF Gaming F15", 65000.0, vec![Persona::Gamer, Persona::Student])
            ],
            vec![],
            true
        )
    }

    #[test]
    fn lookup_is_case_insensitive_and_returns_first_match() {
        let outcome = get_laptop_info(&catalog(), "inspiron");
        match outcome {
            ToolOutcome::Success { data, count } => {
                assert_eq!(count, None);
                assert_eq!(data["Model Name"], "Inspiron 15");
                assert_eq!(data["Graphics Processor"], Value::Null);
                assert_eq!(data["Laptop Weight"], Value::Null);
                assert_eq!(data["Specification_Ratings"], json!({}));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn lookup_miss_names_the_term() {
        let outcome = get_laptop_info(&catalog(), "MacBook Air M2");
        assert_eq!(outcome.status(), "not_found");
        assert!(outcome.message().unwrap().contains("'MacBook Air M2'"));
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let criteria = Criteria {
            budget_min: Some(65000.0),
            budget_max: Some(70000.0),
            personas: vec![],
        };
        match recommend_laptops_by_criteria(&catalog(), &criteria) {
            ToolOutcome::Success { count, data } => {
                assert_eq!(count, Some(2));
                assert_eq!(data[0]["Model Name"], "Inspiron 14 Plus");
                assert_eq!(data[1]["Model Name"], "TUF Gaming F15");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn persona_filter_matches_any_overlap() {
        let criteria = Criteria {
            personas: vec![Persona::Gamer, Persona::Developer],
            ..Criteria::default()
        };
        match recommend_laptops_by_criteria(&catalog(), &criteria) {
            ToolOutcome::Success { count, .. } => assert_eq!(count, Some(3)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn summary_has_recommendation_columns_only() {
        match recommend_laptops_by_criteria(&catalog(), &Criteria::default()) {
            ToolOutcome::Success { data, .. } => {
                let keys: Vec<&String> = data[0].as_object().unwrap().keys().collect();
                assert_eq!(keys.len(), 7);
                assert!(data[0].get("Laptop Weight").is_none());
                assert_eq!(data[0]["Persona"], json!(["student", "budget_conscious"]));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_result_is_not_found() {
        let criteria = Criteria {
            budget_max: Some(1000.0),
            ..Criteria::default()
        };
        assert_eq!(recommend_laptops_by_criteria(&catalog(), &criteria).status(), "not_found");
    }

    #[test]
    fn absent_persona_data_is_an_error() {
        let catalog = Catalog::new(vec![laptop("Inspiron 15", 35000.0, vec![])], vec![], false);
        let criteria = Criteria {
            personas: vec![Persona::Gamer],
            ..Criteria::default()
        };
        let outcome = recommend_laptops_by_criteria(&catalog, &criteria);
        assert_eq!(outcome, ToolOutcome::error(PERSONA_MISSING_MESSAGE));

        // Without a persona filter the same catalog still answers.
        assert_eq!(recommend_laptops_by_criteria(&catalog, &Criteria::default()).status(), "success");
    }

    #[test]
    fn queries_report_unloaded_catalog() {
        let empty = Catalog::not_loaded();
        assert_eq!(get_laptop_info(&empty, "x"), ToolOutcome::error(NOT_LOADED_MESSAGE));
        assert_eq!(
            recommend_laptops_by_criteria(&empty, &Criteria::default()),
            ToolOutcome::error(NOT_LOADED_MESSAGE)
        );
    }

    #[test]
    fn end_conversation_is_ended() {
        let outcome = end_conversation();
        assert!(outcome.is_ended());
        assert_eq!(outcome.status(), "ended");
    }
}
