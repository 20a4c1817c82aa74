use crate::core::error::ParseError;
use crate::core::model::{Panel, Story};
use log::debug;
use serde_json::{Map, Value};

/// Removes a markdown fence (```` ```json ```` or plain ```` ``` ````) wrapped
/// around a model reply, along with surrounding whitespace.
pub fn strip_code_blocks(s: &str) -> &str {
    let s = s.trim();
    let s = s
        .strip_prefix("```json")
        .or_else(|| s.strip_prefix("```JSON"))
        .or_else(|| s.strip_prefix("```"))
        .unwrap_or(s);
    let s = s.trim_end();
    s.strip_suffix("```").unwrap_or(s).trim()
}

/// Reads a story outline out of raw model text.
///
/// Panel order in the array is authoritative. `panelNumber` values are kept as
/// given and not checked against their position; `imageUrl` is ignored.
pub fn parse(raw: &str) -> Result<Story, ParseError> {
    let clean_json = strip_code_blocks(raw);
    debug!("Parsing outline ({} bytes)", clean_json.len());

    let value: Value = serde_json::from_str(clean_json).map_err(|e| ParseError::Malformed {
        detail: e.to_string(),
    })?;
    let object = value.as_object().ok_or_else(|| ParseError::Malformed {
        detail: "top-level value is not an object".to_string(),
    })?;

    let title = object
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .ok_or(ParseError::MissingField("title"))?;

    let panels = object
        .get("panels")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingField("panels"))?;

    let panels = panels
        .iter()
        .enumerate()
        .map(|(index, value)| {
            value
                .as_object()
                .and_then(parse_panel)
                .ok_or(ParseError::InvalidPanel(index))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Story::new(title, panels))
}

fn parse_panel(obj: &Map<String, Value>) -> Option<Panel> {
    let panel_number = obj
        .get("panelNumber")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())?;
    let description = obj.get("description").and_then(Value::as_str)?;
    let dialogue = obj.get("dialogue").and_then(Value::as_str)?;

    Some(Panel {
        panel_number,
        description: description.to_string(),
        dialogue: dialogue.to_string(),
        image: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_PANELS: &str = r#"{
        "title": "The Brave Little Toaster",
        "panels": [
            {"panelNumber": 1, "description": "A toaster wakes up", "dialogue": "Good morning!"},
            {"panelNumber": 2, "description": "It hops off the counter", "dialogue": "Adventure time."},
            {"panelNumber": 3, "description": "It finds the garden", "dialogue": "So green!"}
        ]
    }"#;

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("json"), "json");
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("  ```json  \n  {}  \n  ```  "), "{}");
        assert_eq!(strip_code_blocks("```json\n{}"), "{}");
    }

    #[test]
    fn test_parse_well_formed() {
        let story = parse(THREE_PANELS).unwrap();
        assert_eq!(story.title(), "The Brave Little Toaster");
        assert_eq!(story.total_panels(), 3);
        let numbers: Vec<u32> = story.panels().iter().map(|p| p.panel_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(story.panels()[1].dialogue, "Adventure time.");
        assert!(story.panels().iter().all(|p| p.image.is_none()));
    }

    #[test]
    fn test_parse_fenced() {
        let raw = format!("```json\n{}\n```", THREE_PANELS);
        assert_eq!(parse(&raw).unwrap().total_panels(), 3);

        let raw = format!("\n```\n{}\n```\n", THREE_PANELS);
        assert_eq!(parse(&raw).unwrap().total_panels(), 3);
    }

    #[test]
    fn test_parse_keeps_array_order() {
        let raw = r#"{"title": "T", "panels": [
            {"panelNumber": 2, "description": "b", "dialogue": "b"},
            {"panelNumber": 1, "description": "a", "dialogue": "a"}
        ]}"#;
        let story = parse(raw).unwrap();
        assert_eq!(story.panels()[0].description, "b");
        assert_eq!(story.panels()[0].panel_number, 2);
    }

    #[test]
    fn test_parse_ignores_image_url() {
        let raw = r#"{"title": "T", "panels": [
            {"panelNumber": 1, "description": "a", "dialogue": "a", "imageUrl": "http://x"}
        ]}"#;
        assert!(parse(raw).unwrap().panels()[0].image.is_none());
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse("Sure! Here is your comic: {").unwrap_err();
        assert_eq!(err.reason(), "malformed");
        assert_eq!(parse("[1, 2]").unwrap_err().reason(), "malformed");
    }

    #[test]
    fn test_parse_missing_title() {
        let err = parse(r#"{"panels": []}"#).unwrap_err();
        assert_eq!(err.reason(), "missing-field:title");
        let err = parse(r#"{"title": "", "panels": []}"#).unwrap_err();
        assert_eq!(err.reason(), "missing-field:title");
        let err = parse(r#"{"title": 7, "panels": []}"#).unwrap_err();
        assert_eq!(err.reason(), "missing-field:title");
    }

    #[test]
    fn test_parse_missing_panels() {
        let err = parse(r#"{"title": "T"}"#).unwrap_err();
        assert_eq!(err.reason(), "missing-field:panels");
        let err = parse(r#"{"title": "T", "panels": {}}"#).unwrap_err();
        assert_eq!(err.reason(), "missing-field:panels");
    }

    #[test]
    fn test_parse_panel_without_dialogue() {
        let raw = r#"{"title": "T", "panels": [
            {"panelNumber": 1, "description": "a", "dialogue": "a"},
            {"panelNumber": 2, "description": "b"}
        ]}"#;
        assert_eq!(parse(raw).unwrap_err().reason(), "invalid-panel:1");
    }

    #[test]
    fn test_parse_panel_with_bad_number() {
        let raw = r#"{"title": "T", "panels": [
            {"panelNumber": "one", "description": "a", "dialogue": "a"}
        ]}"#;
        assert_eq!(parse(raw).unwrap_err().reason(), "invalid-panel:0");
        let raw = r#"{"title": "T", "panels": ["not an object"]}"#;
        assert_eq!(parse(raw).unwrap_err().reason(), "invalid-panel:0");
    }
}
