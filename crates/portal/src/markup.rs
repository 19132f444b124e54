//! Selectors and label texts the portal renders.
//!
//! The portal is an Ant Design single-page app; every value here is part of
//! an external contract this crate does not control.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalMarkup {
    /// Base selector for elements located purely by their own text.
    pub any_element: String,

    pub username_input: String,
    pub password_input: String,
    pub login_button: String,
    pub login_button_text: String,
    /// Text shown once credentials are accepted.
    pub login_prompt: String,

    pub menu_toggle: String,
    pub menu_ready: String,
    pub monitoring_entry_text: String,
    pub more_button: String,

    pub field_label: String,
    pub ticket_type_label: String,
    pub select_container: String,
    pub select_trigger: String,
    pub select_option: String,

    pub start_date_input: String,
    pub end_date_input: String,
    /// The date inputs are rendered twice; this index picks the live one.
    pub date_input_index: usize,
    pub picker_popup: String,
    pub picker_year_label: String,
    pub picker_month_label: String,
    pub picker_prev_year: String,
    pub picker_next_year: String,
    pub picker_prev_month: String,
    pub picker_next_month: String,
    pub picker_disabled_class: String,
    pub picker_ok: String,

    pub status_radio: String,
    pub status_label: String,

    pub query_button: String,
    pub query_button_text: String,
    pub results_marker: String,
    pub export_icon: String,
    pub export_menu_item: String,
    pub csv_entry_text: String,
}

impl Default for PortalMarkup {
    fn default() -> Self {
        Self {
            any_element: "body *".into(),

            username_input: r#"input[placeholder="User ID"]"#.into(),
            password_input: r#"input[placeholder="Password"]"#.into(),
            login_button: "button".into(),
            login_button_text: "OSS Login".into(),
            login_prompt: "Please select a job to log in".into(),

            menu_toggle: ".js-menu".into(),
            menu_ready: ".nav-title".into(),
            monitoring_entry_text: "Trouble Ticket Monitoring".into(),
            more_button: r#"button:has(span[role="img"][aria-label="more"])"#.into(),

            field_label: "label".into(),
            ticket_type_label: "Ticket Type".into(),
            select_container: "div.ant-select".into(),
            select_trigger: "div.ant-select-selector".into(),
            select_option: ".ant-select-item-option-content".into(),

            start_date_input: "#BEGIN_ACCEPT_TIME".into(),
            end_date_input: "#END_ACCEPT_TIME".into(),
            date_input_index: 1,
            picker_popup: ".ant-picker-dropdown".into(),
            picker_year_label: ".ant-picker-year-btn".into(),
            picker_month_label: ".ant-picker-month-btn".into(),
            picker_prev_year: ".ant-picker-header-super-prev-btn".into(),
            picker_next_year: ".ant-picker-header-super-next-btn".into(),
            picker_prev_month: ".ant-picker-header-prev-btn".into(),
            picker_next_month: ".ant-picker-header-next-btn".into(),
            picker_disabled_class: "ant-picker-cell-disabled".into(),
            picker_ok: ".ant-picker-ok".into(),

            status_radio: "#HIS_FLAG label".into(),
            status_label: "Status".into(),

            query_button: "button.ant-btn.ant-btn-primary".into(),
            query_button_text: "Query".into(),
            results_marker: r#"label[for="SP_ID"][title="Operator"]"#.into(),
            export_icon: r#"span[role="img"][aria-label="export"]"#.into(),
            export_menu_item: "li.ant-dropdown-menu-item".into(),
            csv_entry_text: "CSV".into(),
        }
    }
}
