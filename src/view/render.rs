//! Template data and the renderer seam.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::rows::EntryRow;
use crate::url::PageUrl;

pub const VIEW_TEMPLATE: &str = "mod_ogte/viewpage";
pub const DOWNLOAD_TEMPLATE: &str = "mod_ogte/downloadpage";

/// Turns a named template and its data into page output.
pub trait Renderer {
    type Output;

    fn render_from_template(&self, template: &str, data: &serde_json::Value) -> Result<Self::Output>;
}

/// A form with a single button, submitting to `url`.
#[derive(Debug, Clone, Serialize)]
pub struct SingleButton {
    pub url: PageUrl,
    pub label: String,
    pub method: &'static str,
    pub class: &'static str,
}

impl SingleButton {
    pub fn get(url: PageUrl, label: String) -> Self {
        Self {
            url,
            label,
            method: "get",
            class: "singlebutton ogtestart",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewPageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addnewbutton: Option<SingleButton>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub haveentries: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<EntryRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadPageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    pub downloadbutton: SingleButton,
}

/// Template output that keeps the template name and its data as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderedTemplate {
    pub template: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    type Output = RenderedTemplate;

    fn render_from_template(&self, template: &str, data: &serde_json::Value) -> Result<RenderedTemplate> {
        Ok(RenderedTemplate {
            template: template.to_string(),
            data: data.clone(),
        })
    }
}
