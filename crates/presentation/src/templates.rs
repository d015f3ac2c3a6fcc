use crate::error::{PresentationError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

pub const CONTACT_TEMPLATE: &str = "contact";
pub const CONTACT_TAGS_TEMPLATE: &str = "contact_tags";
pub const TAG_TEMPLATE: &str = "tag";
pub const NO_CONTACTS_TEMPLATE: &str = "no_contacts";

const MAX_PARTIAL_DEPTH: usize = 8;

/// Turns template ids plus JSON data into markup.
///
/// Implementations must be idempotent: identical inputs, identical markup.
pub trait Renderer {
    fn render(&self, template_id: &str, data: &Value) -> Result<String>;
}

/// Named markup templates.
///
/// Syntax: `{field}` inserts a top-level field of the data object
/// (HTML-escaped), `{>name}` includes another template with the same data,
/// and `{{` / `}}` produce literal braces.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemplateSet {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

const fn default_max_chars() -> usize {
    65_536
}

impl Default for TemplateSet {
    fn default() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(
            CONTACT_TEMPLATE.to_string(),
            concat!(
                "<h3>{full_name}</h3>",
                "<dl><dt>Phone Number:</dt><dd>{phone_number}</dd>",
                "<dt>Email:</dt><dd>{email}</dd>{>contact_tags}</dl>",
                "<a href=\"/api/contacts/{id}\" data-method=\"PUT\">Edit</a>",
                "<a href=\"/api/contacts/{id}\" data-method=\"DELETE\">Delete</a>"
            )
            .to_string(),
        );
        templates.insert(
            CONTACT_TAGS_TEMPLATE.to_string(),
            "<dt>Tags:</dt><dd>{tag_list}</dd>".to_string(),
        );
        templates.insert(
            TAG_TEMPLATE.to_string(),
            "<input type=\"checkbox\" name=\"tag\" value=\"{name}\"><label>{name}</label>"
                .to_string(),
        );
        templates.insert(
            NO_CONTACTS_TEMPLATE.to_string(),
            "<p>There are no contacts.</p>".to_string(),
        );
        Self {
            max_chars: default_max_chars(),
            templates,
        }
    }
}

impl TemplateSet {
    /// Parse a TOML override file. Templates it does not mention keep their
    /// built-in defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let overrides: TemplateSet = toml::from_str(raw)?;
        let mut set = Self::default();
        set.max_chars = overrides.max_chars;
        set.templates.extend(overrides.templates);
        set.validate()?;
        Ok(set)
    }

    pub fn insert(&mut self, id: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(id.into(), template.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.templates.get(id).map(String::as_str)
    }

    /// Check every template once, up front: syntax, partial references and
    /// partial cycles.
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(PresentationError::TemplateError(
                "max_chars must be > 0".to_string(),
            ));
        }

        for (id, template) in &self.templates {
            for name in extract_placeholders(template)? {
                if let Some(partial) = name.strip_prefix('>') {
                    let partial = partial.trim();
                    if !self.templates.contains_key(partial) {
                        return Err(PresentationError::TemplateError(format!(
                            "template '{id}' includes unknown partial '{partial}'"
                        )));
                    }
                }
            }
        }

        for id in self.templates.keys() {
            self.check_partial_cycle(id, &mut BTreeSet::new())?;
        }

        log::debug!("validated {} templates", self.templates.len());
        Ok(())
    }

    fn check_partial_cycle<'a>(&'a self, id: &'a str, stack: &mut BTreeSet<&'a str>) -> Result<()> {
        if !stack.insert(id) {
            return Err(PresentationError::TemplateError(format!(
                "partial cycle through '{id}'"
            )));
        }
        if let Some(template) = self.templates.get(id) {
            for name in extract_placeholders(template)? {
                if let Some(partial) = name.strip_prefix('>') {
                    let partial = partial.trim();
                    if let Some((key, _)) = self.templates.get_key_value(partial) {
                        self.check_partial_cycle(key.as_str(), stack)?;
                    }
                }
            }
        }
        stack.remove(id);
        Ok(())
    }

    fn render_at_depth(&self, template_id: &str, data: &Value, depth: usize) -> Result<String> {
        if depth > MAX_PARTIAL_DEPTH {
            return Err(PresentationError::TemplateError(format!(
                "partial nesting deeper than {MAX_PARTIAL_DEPTH} at '{template_id}'"
            )));
        }
        let template = self
            .get(template_id)
            .ok_or_else(|| PresentationError::UnknownTemplate(template_id.to_string()))?;

        render_template(template, self.max_chars, |name| {
            if let Some(partial) = name.strip_prefix('>') {
                return self.render_at_depth(partial.trim(), data, depth + 1);
            }
            Ok(escape_html(&field_text(data, name)))
        })
    }
}

impl Renderer for TemplateSet {
    fn render(&self, template_id: &str, data: &Value) -> Result<String> {
        self.render_at_depth(template_id, data, 0)
    }
}

fn field_text(data: &Value, name: &str) -> String {
    match data.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn extract_placeholders(template: &str) -> Result<Vec<String>> {
    let mut placeholders = Vec::new();
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if matches!(chars.peek(), Some('{')) {
                    let _ = chars.next();
                    continue;
                }
                placeholders.push(read_placeholder(&mut chars)?);
            }
            '}' => {
                if matches!(chars.peek(), Some('}')) {
                    let _ = chars.next();
                    continue;
                }
                return Err(PresentationError::TemplateError(
                    "Invalid template: stray '}'".into(),
                ));
            }
            _ => {}
        }
    }
    Ok(placeholders)
}

fn read_placeholder(chars: &mut impl Iterator<Item = char>) -> Result<String> {
    let mut name = String::new();
    loop {
        match chars.next() {
            Some('}') => break,
            Some('{') => {
                return Err(PresentationError::TemplateError(
                    "Invalid template: nested '{' inside placeholder".into(),
                ));
            }
            Some(c) => name.push(c),
            None => {
                return Err(PresentationError::TemplateError(
                    "Invalid template: unterminated '{...}' placeholder".into(),
                ));
            }
        }
    }
    let name = name.trim();
    if name.is_empty() || name == ">" {
        return Err(PresentationError::TemplateError(
            "Invalid template: empty placeholder '{}'".into(),
        ));
    }
    Ok(name.to_string())
}

fn render_template(
    template: &str,
    max_chars: usize,
    mut resolve: impl FnMut(&str) -> Result<String>,
) -> Result<String> {
    let mut out = String::new();
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if out.len() >= max_chars {
            break;
        }

        match ch {
            '{' => {
                if matches!(chars.peek(), Some('{')) {
                    let _ = chars.next();
                    push_str_bounded(&mut out, "{", max_chars);
                    continue;
                }
                let name = read_placeholder(&mut chars)?;
                let value = resolve(&name)?;
                push_str_bounded(&mut out, &value, max_chars);
            }
            '}' => {
                if matches!(chars.peek(), Some('}')) {
                    let _ = chars.next();
                    push_str_bounded(&mut out, "}", max_chars);
                    continue;
                }
                return Err(PresentationError::TemplateError(
                    "Invalid template: stray '}'".into(),
                ));
            }
            other => {
                let mut buf = [0u8; 4];
                push_str_bounded(&mut out, other.encode_utf8(&mut buf), max_chars);
            }
        }
    }

    Ok(out)
}

fn push_str_bounded(out: &mut String, value: &str, max_chars: usize) {
    let remaining = max_chars.saturating_sub(out.len());
    if remaining == 0 {
        return;
    }
    if value.len() <= remaining {
        out.push_str(value);
        return;
    }
    out.push_str(utf8_prefix(value, remaining));
}

fn utf8_prefix(value: &str, max_bytes: usize) -> &str {
    let mut end = 0;
    for (i, _) in value.char_indices() {
        if i > max_bytes {
            break;
        }
        end = i;
    }
    &value[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn default_templates_validate() {
        TemplateSet::default().validate().unwrap();
    }

    #[test]
    fn renders_fields_and_partials() {
        let set = TemplateSet::default();
        let html = set
            .render(
                CONTACT_TEMPLATE,
                &json!({"id": 3, "full_name": "Ann", "email": "a@x", "phone_number": "1", "tag_list": "vip, work"}),
            )
            .unwrap();
        assert!(html.starts_with("<h3>Ann</h3>"));
        assert!(html.contains("<dd>vip, work</dd>"));
        assert!(html.contains("/api/contacts/3"));
    }

    #[test]
    fn escapes_markup_in_values() {
        let mut set = TemplateSet::default();
        set.insert("t", "<b>{name}</b> {{literal}}");
        let html = set.render("t", &json!({"name": "<script>&"})).unwrap();
        assert_eq!(html, "<b>&lt;script&gt;&amp;</b> {literal}");
    }

    #[test]
    fn missing_and_null_fields_render_empty() {
        let mut set = TemplateSet::default();
        set.insert("t", "[{a}|{b}|{c}]");
        let html = set.render("t", &json!({"b": null, "c": true})).unwrap();
        assert_eq!(html, "[||true]");
    }

    #[test]
    fn rendering_is_idempotent() {
        let set = TemplateSet::default();
        let data = json!({"name": "work"});
        assert_eq!(
            set.render(TAG_TEMPLATE, &data).unwrap(),
            set.render(TAG_TEMPLATE, &data).unwrap()
        );
    }

    #[test]
    fn rejects_bad_syntax_and_unknown_templates() {
        let mut set = TemplateSet::default();
        set.insert("stray", "a } b");
        assert!(set.validate().is_err());

        let mut set = TemplateSet::default();
        set.insert("open", "a {b");
        assert!(set.validate().is_err());

        let set = TemplateSet::default();
        assert!(matches!(
            set.render("nope", &json!({})),
            Err(PresentationError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn detects_partial_cycles_and_unknown_partials() {
        let mut set = TemplateSet::default();
        set.insert("a", "{>b}");
        set.insert("b", "{>a}");
        assert!(set.validate().is_err());
        assert!(set.render("a", &json!({})).is_err());

        let mut set = TemplateSet::default();
        set.insert("a", "{>missing}");
        assert!(set.validate().is_err());
    }

    #[test]
    fn toml_overrides_merge_with_defaults() {
        let set = TemplateSet::from_toml_str(
            r#"
            [templates]
            tag = "<span>{name}</span>"
            "#,
        )
        .unwrap();
        assert_eq!(set.render(TAG_TEMPLATE, &json!({"name": "vip"})).unwrap(), "<span>vip</span>");
        assert!(set.get(CONTACT_TEMPLATE).is_some());
        assert_eq!(set.max_chars, 65_536);
    }

    #[test]
    fn output_is_bounded_by_max_chars() {
        let mut set = TemplateSet::default();
        set.max_chars = 4;
        set.insert("t", "{v}");
        assert_eq!(set.render("t", &json!({"v": "abcdefgh"})).unwrap(), "abcd");
    }
}
