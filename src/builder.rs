use crate::config::BackfillSettings;
use crate::form::FormRecord;
use regex::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError(pub String);

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for BuildError {}

impl From<String> for BuildError {
    fn from(msg: String) -> Self {
        BuildError(msg)
    }
}

impl From<&str> for BuildError {
    fn from(msg: &str) -> Self {
        BuildError(msg.into())
    }
}

/// Computes a form's JSON document from the record and an optional fund title.
pub trait FormJsonBuilder {
    fn build(&self, form: &FormRecord, fund_title: Option<&str>) -> Result<Value, BuildError>;
}

impl<F> FormJsonBuilder for F
where
    F: Fn(&FormRecord, Option<&str>) -> Result<Value, BuildError>,
{
    fn build(&self, form: &FormRecord, fund_title: Option<&str>) -> Result<Value, BuildError> {
        self(form, fund_title)
    }
}

/// Emits a form-runner document: an intro page leading to the summary page.
pub struct RunnerFormBuilder {
    settings: BackfillSettings,
}

impl RunnerFormBuilder {
    pub fn new(settings: BackfillSettings) -> Self {
        Self { settings }
    }
}

impl FormJsonBuilder for RunnerFormBuilder {
    fn build(&self, form: &FormRecord, fund_title: Option<&str>) -> Result<Value, BuildError> {
        let name = form
            .display_name(&self.settings)
            .map_err(|e| BuildError(e.to_string()))?;

        let slug = form
            .runner_publish_name
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&name));
        if slug.is_empty() {
            return Err(BuildError(format!(
                "form {} has no publishable name",
                form.form_id
            )));
        }

        let start_page = format!("/intro-{slug}");
        let intro = match fund_title {
            Some(title) => format!("This section is part of your application to {title}."),
            None => "Complete this section of your application.".to_string(),
        };

        Ok(json!({
            "name": name,
            "startPage": start_page,
            "pages": [
                {
                    "path": start_page,
                    "title": name,
                    "components": [
                        {
                            "name": "intro-text",
                            "type": "Html",
                            "content": format!("<p class=\"govuk-body\">{}</p>", escape_html(&intro)),
                            "options": {},
                            "schema": {}
                        }
                    ],
                    "next": [{ "path": "/summary" }]
                },
                {
                    "path": "/summary",
                    "title": "Check your answers",
                    "controller": "./pages/summary.js",
                    "components": [],
                    "next": []
                }
            ],
            "lists": [],
            "conditions": [],
            "sections": [],
            "outputs": [],
            "skipSummary": false,
            "metadata": {
                "formId": form.form_id,
                "fundTitle": fund_title,
            }
        }))
    }
}

/// Lowercase, runs of anything but `[a-z0-9]` collapsed to `-`, no leading/trailing `-`.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    NON_SLUG.replace_all(&lower, "-").trim_matches('-').to_string()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
