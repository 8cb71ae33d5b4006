//! English strings for the ogte component.

/// Look up a component string by key. Unknown keys come back as `[[key]]`.
pub fn get_string(key: &str) -> String {
    let s = match key {
        "pluginname" | "modulename" => "OGTE",
        "download" => "Download",
        "addnew" => "Add new",
        "addeditlists" => "Add/edit lists",
        "editinglist" => "Editing {$a}",
        "listformtitle" => "List",
        "listname" => "Name",
        "listdescription" => "Description",
        "liststatus" => "Status",
        "savelist" => "Save list",
        "cancel" => "Cancel",
        "required" => "Required",
        "invalidoption" => "Select one of the available options",
        "accessdenied" => "Access denied",
        "invalidcoursemodule" => "Invalid course module ID",
        "invalidcmid" => "Course Module ID was incorrect",
        "coursemisconf" => "Course is misconfigured",
        _ => return format!("[[{}]]", key),
    };
    s.to_string()
}

/// Look up a string and substitute `{$a}` with `a`.
pub fn get_string_a(key: &str, a: &str) -> String {
    get_string(key).replace("{$a}", a)
}
