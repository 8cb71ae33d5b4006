use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;

use super::{Element, FormSchema, FormValue, ParamType, SelectOption, ValidationErrors};
use crate::models::{Activity, ListFormData, ListStatus};
use crate::strings::{get_string, get_string_a};

/// Tag of the list type every activity has.
pub const STANDARD_LIST_TYPE: &str = "standard";

#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Unknown list type: {0}")]
    UnknownListType(String),

    #[error("{0}")]
    Construction(String),
}

/// Behaviour a kind of list adds on top of the standard list form.
///
/// Every hook has a default, so the standard list type implements nothing
/// but its tag.
pub trait ListType: Send + Sync {
    fn tag(&self) -> &'static str;

    /// Standard list types are edited with the plain form. Others may
    /// take over in [`ListType::construction_override`].
    fn is_standard(&self) -> bool {
        true
    }

    /// Append fields after the standard ones and before the action buttons.
    fn custom_definition(&self, _form: &mut FormSchema) {}

    /// Adjust the form once existing data has been loaded into it.
    fn custom_definition_after_data(&self, _form: &mut FormSchema) {}

    /// Fold this type's own cleaned fields into the list data, typically into `props`.
    fn custom_data(&self, _values: &BTreeMap<String, FormValue>, _data: &mut ListFormData) {}

    /// Called before the form is shown or processed for list `itemid` (0 for a
    /// new list). Returning `Ok(false)` means the type handled the request
    /// itself and the form should not be used.
    fn construction_override(&self, _itemid: i64, _activity: &Activity) -> Result<bool, FormError> {
        Ok(true)
    }
}

/// The plain list type.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardList;

impl ListType for StandardList {
    fn tag(&self) -> &'static str {
        STANDARD_LIST_TYPE
    }
}

/// The form for adding and editing a list.
pub struct ListForm {
    schema: FormSchema,
    standard: bool,
    list_type: Arc<dyn ListType>,
}

impl ListForm {
    pub fn new(list_type: Arc<dyn ListType>) -> Self {
        let mut form = Self {
            schema: FormSchema::new(),
            standard: list_type.is_standard(),
            list_type,
        };
        form.definition();
        form
    }

    fn definition(&mut self) {
        let form = &mut self.schema;

        form.add_element(Element::Header {
            name: "listheading".to_string(),
            label: get_string_a("editinglist", &get_string("listformtitle")),
        });

        for hidden in ["id", "courseid", "moduleid"] {
            form.add_element(Element::Hidden {
                name: hidden.to_string(),
            });
            form.set_type(hidden, ParamType::Int);
        }

        form.add_element(Element::Text {
            name: "name".to_string(),
            label: get_string("listname"),
            size: 70,
        });
        form.set_type("name", ParamType::Text);
        form.add_required_rule("name");

        form.add_element(Element::Textarea {
            name: "description".to_string(),
            label: get_string("listdescription"),
        });
        form.set_type("description", ParamType::Text);
        form.add_required_rule("description");

        form.add_element(Element::Select {
            name: "status".to_string(),
            label: get_string("liststatus"),
            options: ListStatus::ALL
                .iter()
                .map(|s| SelectOption {
                    value: s.as_i64().to_string(),
                    label: s.as_str().to_string(),
                })
                .collect(),
        });
        form.set_type("status", ParamType::Int);
        form.add_required_rule("status");

        form.add_element(Element::Hidden {
            name: "props".to_string(),
        });
        form.set_type("props", ParamType::Text);

        self.list_type.custom_definition(&mut self.schema);

        self.schema.add_element(Element::ActionButtons {
            cancel_label: get_string("cancel"),
            submit_label: get_string("savelist"),
        });
    }

    pub fn is_standard(&self) -> bool {
        self.standard
    }

    pub fn list_type(&self) -> &str {
        self.list_type.tag()
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Load existing list data into the form.
    pub fn set_data(&mut self, data: &ListFormData) {
        self.schema.set_value("id", data.id);
        self.schema.set_value("courseid", data.courseid);
        self.schema.set_value("moduleid", data.moduleid);
        self.schema.set_value("name", &data.name);
        self.schema.set_value("description", &data.description);
        self.schema.set_value("status", data.status.as_i64());
        self.schema.set_value("props", &data.props);
        self.list_type.custom_definition_after_data(&mut self.schema);
    }

    pub fn construction_override(&self, itemid: i64, activity: &Activity) -> Result<bool, FormError> {
        self.list_type.construction_override(itemid, activity)
    }

    /// Clean and check a submission, producing list data ready to store.
    pub fn validate(&self, submitted: &HashMap<String, String>) -> Result<ListFormData, FormError> {
        let mut values = self.schema.validate(submitted)?;

        let take_int = |name: &str| values.get(name).map(FormValue::as_int).unwrap_or(0);
        let id = take_int("id");
        let courseid = take_int("courseid");
        let moduleid = take_int("moduleid");
        let status = take_int("status");

        let mut take_text = |name: &str| {
            values
                .remove(name)
                .map(FormValue::into_text)
                .unwrap_or_default()
        };
        let name = take_text("name");
        let description = take_text("description");
        let props = take_text("props");

        let mut data = ListFormData {
            id,
            courseid,
            moduleid,
            name,
            description,
            status: ListStatus::from_i64(status).unwrap_or_default(),
            props,
        };
        self.list_type.custom_data(&values, &mut data);
        Ok(data)
    }
}

/// The list types an installation knows about, by tag.
#[derive(Clone)]
pub struct ListTypeRegistry {
    types: BTreeMap<&'static str, Arc<dyn ListType>>,
}

impl Default for ListTypeRegistry {
    fn default() -> Self {
        let mut registry = Self {
            types: BTreeMap::new(),
        };
        registry.register(Arc::new(StandardList));
        registry
    }
}

impl ListTypeRegistry {
    /// Add a list type, replacing any registered under the same tag.
    pub fn register(&mut self, list_type: Arc<dyn ListType>) {
        self.types.insert(list_type.tag(), list_type);
    }

    pub fn get(&self, tag: &str) -> Option<Arc<dyn ListType>> {
        self.types.get(tag).cloned()
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.types.keys().copied().collect()
    }

    pub fn form_for(&self, tag: &str) -> Result<ListForm, FormError> {
        self.get(tag)
            .map(ListForm::new)
            .ok_or_else(|| FormError::UnknownListType(tag.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityMode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn submission(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn activity() -> Activity {
        Activity {
            id: 1,
            course: 1,
            name: "Reading".to_string(),
            intro: None,
            mode: ActivityMode::Standard,
            preventry: None,
        }
    }

    fn field_names(form: &ListForm) -> Vec<&str> {
        form.schema()
            .elements()
            .iter()
            .filter_map(Element::name)
            .collect()
    }

    /// A list type that imports words from a named source.
    struct SourcedList {
        definitions: AtomicUsize,
    }

    impl ListType for SourcedList {
        fn tag(&self) -> &'static str {
            "sourced"
        }

        fn is_standard(&self) -> bool {
            false
        }

        fn custom_definition(&self, form: &mut FormSchema) {
            self.definitions.fetch_add(1, Ordering::SeqCst);
            form.add_element(Element::Text {
                name: "source".to_string(),
                label: "Source".to_string(),
                size: 40,
            });
            form.set_type("source", ParamType::Text);
        }

        fn custom_definition_after_data(&self, form: &mut FormSchema) {
            if form.value("props").is_some_and(|p| !p.is_empty()) {
                form.set_value("source", "from props");
            }
        }

        fn custom_data(&self, values: &BTreeMap<String, FormValue>, data: &mut ListFormData) {
            if let Some(FormValue::Text(source)) = values.get("source") {
                data.props = format!("source={}", source);
            }
        }

        fn construction_override(&self, itemid: i64, _activity: &Activity) -> Result<bool, FormError> {
            Ok(itemid == 0)
        }
    }

    #[test]
    fn standard_form_declares_fields_in_order() {
        let form = ListForm::new(Arc::new(StandardList));
        assert_eq!(
            field_names(&form),
            vec!["id", "courseid", "moduleid", "name", "description", "status", "props"]
        );
        assert!(matches!(form.schema().elements().first(), Some(Element::Header { .. })));
        assert!(matches!(
            form.schema().elements().last(),
            Some(Element::ActionButtons { .. })
        ));
        assert!(form.is_standard());
    }

    #[test]
    fn name_description_and_status_are_required() {
        let form = ListForm::new(Arc::new(StandardList));
        let err = form.validate(&HashMap::new()).unwrap_err();
        let FormError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let missing: Vec<&str> = errors.fields.keys().map(String::as_str).collect();
        assert_eq!(missing, vec!["description", "name", "status"]);
    }

    #[test]
    fn status_options_are_empty_and_ready() {
        let form = ListForm::new(Arc::new(StandardList));
        let Some(Element::Select { options, .. }) = form.schema().element("status") else {
            panic!("status should be a select");
        };
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["empty", "ready"]);
    }

    #[test]
    fn validate_coerces_ids_and_strips_text() {
        let form = ListForm::new(Arc::new(StandardList));
        let data = form
            .validate(&submission(&[
                ("id", "0"),
                ("courseid", "3x"),
                ("moduleid", "9"),
                ("name", "<i>Core</i> words"),
                ("description", "First 500"),
                ("status", "1"),
            ]))
            .unwrap();

        assert_eq!(data.courseid, 3);
        assert_eq!(data.moduleid, 9);
        assert_eq!(data.name, "Core words");
        assert_eq!(data.status, ListStatus::Ready);
        assert_eq!(data.props, "");
    }

    #[test]
    fn descriptions_keep_comparison_signs() {
        let form = ListForm::new(Arc::new(StandardList));
        let data = form
            .validate(&submission(&[
                ("name", "Words"),
                ("description", "Frequency < 100 and rank > 5"),
                ("status", "1"),
            ]))
            .unwrap();

        assert_eq!(data.description, "Frequency < 100 and rank > 5");
    }

    #[test]
    fn oversized_ids_saturate() {
        let form = ListForm::new(Arc::new(StandardList));
        let data = form
            .validate(&submission(&[
                ("id", "99999999999999999999"),
                ("name", "A"),
                ("description", "B"),
                ("status", "0"),
            ]))
            .unwrap();

        assert_eq!(data.id, i64::MAX);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let form = ListForm::new(Arc::new(StandardList));
        let result = form.validate(&submission(&[
            ("name", "A"),
            ("description", "B"),
            ("status", "5"),
        ]));
        assert!(matches!(result, Err(FormError::Validation(_))));
    }

    #[test]
    fn default_construction_override_succeeds() {
        let form = ListForm::new(Arc::new(StandardList));
        assert!(form.construction_override(12, &activity()).unwrap());
    }

    #[test]
    fn custom_fields_go_between_standard_fields_and_buttons() {
        let sourced = Arc::new(SourcedList {
            definitions: AtomicUsize::new(0),
        });
        let form = ListForm::new(sourced.clone());

        assert_eq!(sourced.definitions.load(Ordering::SeqCst), 1);
        assert_eq!(field_names(&form).last(), Some(&"source"));
        assert!(matches!(
            form.schema().elements().last(),
            Some(Element::ActionButtons { .. })
        ));
        assert!(!form.is_standard());
    }

    #[test]
    fn custom_hooks_see_loaded_data_and_submissions() {
        let mut form = ListForm::new(Arc::new(SourcedList {
            definitions: AtomicUsize::new(0),
        }));
        form.set_data(&ListFormData {
            id: 4,
            props: "source=old".to_string(),
            ..Default::default()
        });
        assert_eq!(form.schema().value("source"), Some("from props"));

        let data = form
            .validate(&submission(&[
                ("name", "A"),
                ("description", "B"),
                ("status", "0"),
                ("source", "wordlist.txt"),
            ]))
            .unwrap();
        assert_eq!(data.props, "source=wordlist.txt");
    }

    #[test]
    fn non_standard_types_can_intercept_construction() {
        let form = ListForm::new(Arc::new(SourcedList {
            definitions: AtomicUsize::new(0),
        }));
        assert!(form.construction_override(0, &activity()).unwrap());
        assert!(!form.construction_override(7, &activity()).unwrap());
    }

    #[test]
    fn registry_resolves_forms_by_tag() {
        let mut registry = ListTypeRegistry::default();
        assert_eq!(registry.tags(), vec![STANDARD_LIST_TYPE]);
        assert!(matches!(
            registry.form_for("sourced"),
            Err(FormError::UnknownListType(_))
        ));

        registry.register(Arc::new(SourcedList {
            definitions: AtomicUsize::new(0),
        }));
        let form = registry.form_for("sourced").unwrap();
        assert_eq!(form.list_type(), "sourced");
    }
}
