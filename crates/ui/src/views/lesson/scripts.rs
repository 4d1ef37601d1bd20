pub(super) fn scroll_to_section_script(dom_id: &str) -> String {
    format!(
        r#"(function() {{
                const el = document.getElementById({dom_id:?});
                if (el) {{
                    el.scrollIntoView({{ behavior: "smooth", block: "start" }});
                }}
            }})();"#
    )
}

pub(super) const SCROLL_TO_TOP_SCRIPT: &str =
    r#"window.scrollTo({ top: 0, behavior: "smooth" });"#;

/// Copies `text`, falling back to selecting the code field when the clipboard API is
/// unavailable.
pub(super) fn copy_code_script(text: &str, field_id: &str) -> String {
    format!(
        r#"(async function() {{
                const text = {text:?};
                try {{
                    await navigator.clipboard.writeText(text);
                }} catch (e) {{
                    const field = document.getElementById({field_id:?});
                    if (field) {{
                        field.select();
                        document.execCommand("copy");
                    }}
                }}
            }})();"#
    )
}

pub(super) fn focus_script(id: &str) -> String {
    format!("document.getElementById({id:?})?.focus();")
}
