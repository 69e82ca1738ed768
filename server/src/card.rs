use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::event::HistoryEvent;
use crate::glossary::{annotate, Segment};

/// Where to focus an illustration when it has no stored position.
const DEFAULT_IMAGE_POSITION: &str = "center";

/// The event of the day as the front end displays it: the story split
/// into paragraphs, and the story and fun fact marked up with the
/// event’s glossary.
#[derive(Debug, Serialize)]
pub struct DailyCard<'a> {
    id: Uuid,
    date: &'a str,
    year: i32,
    title: &'a str,
    description: &'a str,
    category: &'a str,
    image: Image<'a>,
    paragraphs: Vec<Vec<Segment<'a>>>,
    fun_fact: Vec<Segment<'a>>,
    tags: &'a [String],
}

#[derive(Debug, Serialize)]
struct Image<'a> {
    url: &'a Url,
    credit: &'a str,
    position: &'a str,
}

impl<'a> DailyCard<'a> {
    pub fn new(event: &'a HistoryEvent) -> Self {
        let glossary = &event.glossary;

        let paragraphs = event
            .story
            .lines()
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty())
            .map(|paragraph| annotate(paragraph, glossary).collect())
            .collect();

        Self {
            id: event.id,
            date: &event.date,
            year: event.year,
            title: &event.title,
            description: &event.description,
            category: &event.category,
            image: Image {
                url: &event.image_url,
                credit: &event.image_credit,
                position: event
                    .image_position
                    .as_deref()
                    .unwrap_or(DEFAULT_IMAGE_POSITION),
            },
            paragraphs,
            fun_fact: annotate(&event.fun_fact, glossary).collect(),
            tags: &event.tags,
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use uuid::Uuid;

    use super::DailyCard;
    use crate::event::{GlossaryTerm, HistoryEvent};

    fn moon_landing() -> HistoryEvent {
        HistoryEvent {
            id: Uuid::nil(),
            date: "1969-07-20".to_string(),
            year: 1969,
            title: "El gran salto de la humanidad".to_string(),
            description: "Apolo 11 llega a la Luna.".to_string(),
            category: "Ciencia".to_string(),
            image_url: "https://images.unsplash.com/photo-1541873676-a18131494184"
                .parse()
                .unwrap(),
            image_credit: "NASA".to_string(),
            image_position: None,
            story: "Neil Armstrong descendió por la escalerilla.\n  \nEs un pequeño paso para el hombre.\r\n".to_string(),
            fun_fact: "La computadora del Apolo tenía menos potencia que un reloj digital.".to_string(),
            tags: vec!["Espacio".to_string(), "Guerra Fría".to_string()],
            glossary: vec![
                GlossaryTerm::new("Apolo", "Programa espacial de la NASA."),
                GlossaryTerm::new("Neil Armstrong", "Primer ser humano en la Luna."),
            ],
            last_shown_at: None,
        }
    }

    #[test]
    fn splits_and_annotates_the_story() {
        let event = moon_landing();
        let card = serde_json::to_value(DailyCard::new(&event)).unwrap();

        assert_eq!(
            card["paragraphs"],
            json!([
                [
                    {"kind": "term", "text": "Neil Armstrong", "definition": "Primer ser humano en la Luna."},
                    {"kind": "plain", "text": " descendió por la escalerilla."}
                ],
                [
                    {"kind": "plain", "text": "Es un pequeño paso para el hombre."}
                ]
            ])
        );
    }

    #[test]
    fn annotates_the_fun_fact() {
        let event = moon_landing();
        let card = serde_json::to_value(DailyCard::new(&event)).unwrap();

        assert_eq!(card["fun_fact"][1]["kind"], "term");
        assert_eq!(card["fun_fact"][1]["text"], "Apolo");
        assert_eq!(card["fun_fact"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn image_position_defaults_to_center() {
        let mut event = moon_landing();
        let card = serde_json::to_value(DailyCard::new(&event)).unwrap();

        assert_eq!(card["image"]["position"], "center");

        event.image_position = Some("0% 30%".to_string());
        let card = serde_json::to_value(DailyCard::new(&event)).unwrap();

        assert_eq!(card["image"]["position"], "0% 30%");
        assert_eq!(card["image"]["credit"], "NASA");
        assert_eq!(card["tags"], json!(["Espacio", "Guerra Fría"]));
    }
}
