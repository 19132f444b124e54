//! Scripted in-memory portal for exercising the workflow without a browser.
//!
//! Elements are resolved from the same [`PortalMarkup`] selectors the
//! workflow uses, and every visible effect (login, paging, selections,
//! downloads) is recorded in [`FakeState`].

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    async_trait::async_trait,
    chrono::{Datelike, NaiveDate},
    secrecy::Secret,
};

use {
    ticketscope_browser::{BrowserError, Download, Locator, PageDriver, SessionLauncher},
    ticketscope_config::schema::DEFAULT_JOB_CONTEXT,
};

use crate::{
    markup::PortalMarkup,
    settings::{PortalSettings, Timeouts},
};

pub(crate) const SAMPLE_CSV: &str = "Ticket No,Ticket Type,Accept Time,Status\n\
                                     TT-1001,Complaint,2024-01-15 09:12,Open\n\
                                     TT-1002,Complaint,2024-01-18 16:40,Closed\n";

const TICKET_TYPE_CONTROL: &str = "rc_select_ticket_type";

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Settings with short budgets so negative paths finish quickly.
pub(crate) fn settings() -> PortalSettings {
    let budget = Duration::from_millis(50);
    PortalSettings {
        url: "https://oss.test/portal".into(),
        username: "agent".into(),
        password: Secret::new("hunter2".into()),
        job_context: DEFAULT_JOB_CONTEXT.into(),
        timeouts: Timeouts {
            navigation: budget,
            login: budget,
            quiescence: budget,
            option: budget,
            download: budget,
        },
        max_paging_steps: 240,
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeState {
    pub calls: Vec<String>,
    pub closes: usize,
    /// Selector → typed value.
    pub filled: HashMap<String, String>,
    pub logged_in: bool,
    pub context_selected: bool,
    pub menu_open: bool,
    pub monitoring_open: bool,
    pub filter_panel_open: bool,
    pub dropdown_open: bool,
    pub selected_option: Option<String>,
    pub selected_radio: Option<String>,
    pub popup_open: bool,
    /// Displayed year and zero-based month.
    pub shown: (i32, u32),
    pub pending_day: Option<NaiveDate>,
    pub committed: Vec<NaiveDate>,
    pub year_pages: u32,
    pub month_pages: u32,
    pub query_submitted: bool,
    pub results_opened: bool,
    pub export_menu_open: bool,
    pub downloads: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct FakePortalBuilder {
    calendar_at: NaiveDate,
    options: Vec<String>,
    radios: Vec<String>,
    accept_login: bool,
    disabled: Vec<NaiveDate>,
    missing: Vec<NaiveDate>,
    month_label_override: Option<String>,
    show_results: bool,
    cancel_download: bool,
    download: Vec<u8>,
    fail_clicks_on: Option<String>,
    fail_close: bool,
}

impl Default for FakePortalBuilder {
    fn default() -> Self {
        Self {
            calendar_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            options: vec!["Complaint".into(), "Complaint Escalation".into(), "Fault".into()],
            radios: vec!["Current".into(), "History".into(), "Both".into()],
            accept_login: true,
            disabled: Vec::new(),
            missing: Vec::new(),
            month_label_override: None,
            show_results: true,
            cancel_download: false,
            download: SAMPLE_CSV.as_bytes().to_vec(),
            fail_clicks_on: None,
            fail_close: false,
        }
    }
}

impl FakePortalBuilder {
    pub fn calendar_at(mut self, date: NaiveDate) -> Self {
        self.calendar_at = date;
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn radios<I, S>(mut self, radios: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.radios = radios.into_iter().map(Into::into).collect();
        self
    }

    pub fn reject_login(mut self) -> Self {
        self.accept_login = false;
        self
    }

    pub fn disabled_date(mut self, date: NaiveDate) -> Self {
        self.disabled.push(date);
        self
    }

    pub fn missing_date(mut self, date: NaiveDate) -> Self {
        self.missing.push(date);
        self
    }

    pub fn month_label_override(mut self, label: &str) -> Self {
        self.month_label_override = Some(label.into());
        self
    }

    pub fn hide_results(mut self) -> Self {
        self.show_results = false;
        self
    }

    pub fn cancel_download(mut self) -> Self {
        self.cancel_download = true;
        self
    }

    pub fn download_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.download = bytes;
        self
    }

    pub fn fail_clicks_on(mut self, selector: &str) -> Self {
        self.fail_clicks_on = Some(selector.into());
        self
    }

    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn build(self) -> FakePortal {
        let state = FakeState {
            shown: (self.calendar_at.year(), self.calendar_at.month0()),
            ..FakeState::default()
        };
        FakePortal {
            markup: PortalMarkup::default(),
            script: Arc::new(self),
            state: Arc::new(Mutex::new(state)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Element {
    UsernameInput,
    PasswordInput,
    LoginButton,
    Text(String),
    MenuToggle,
    MenuReady,
    MoreButton,
    Label { text: String, target: String },
    SelectTrigger,
    Option(String),
    DateInput,
    Popup,
    YearLabel,
    MonthLabel,
    Pager { year: bool, forward: bool },
    Day(NaiveDate),
    PickerOk,
    Radio(String),
    QueryButton,
    ResultsMarker,
    ExportIcon,
    ExportItem(String),
}

/// Clones share one state, so a launcher can keep a handle for assertions.
#[derive(Clone)]
pub(crate) struct FakePortal {
    markup: PortalMarkup,
    script: Arc<FakePortalBuilder>,
    state: Arc<Mutex<FakeState>>,
}

impl FakePortal {
    pub fn builder() -> FakePortalBuilder {
        FakePortalBuilder::default()
    }

    pub fn state(&self) -> FakeState {
        self.state.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn element_text(&self, element: &Element) -> String {
        match element {
            Element::Text(text)
            | Element::Label { text, .. }
            | Element::Option(text)
            | Element::Radio(text)
            | Element::ExportItem(text) => text.clone(),
            Element::LoginButton => self.markup.login_button_text.clone(),
            Element::QueryButton => self.markup.query_button_text.clone(),
            _ => String::new(),
        }
    }

    fn candidates(&self, state: &FakeState, target: &Locator) -> Vec<Element> {
        let m = &self.markup;
        let script = &self.script;
        let sel = target.selector();
        let in_popup = target
            .scope()
            .is_some_and(|scope| scope.selector() == m.picker_popup);

        let mut found = if in_popup {
            if !state.popup_open {
                Vec::new()
            } else if sel == m.picker_year_label {
                vec![Element::YearLabel]
            } else if sel == m.picker_month_label {
                vec![Element::MonthLabel]
            } else if sel == m.picker_prev_year {
                vec![Element::Pager { year: true, forward: false }]
            } else if sel == m.picker_next_year {
                vec![Element::Pager { year: true, forward: true }]
            } else if sel == m.picker_prev_month {
                vec![Element::Pager { year: false, forward: false }]
            } else if sel == m.picker_next_month {
                vec![Element::Pager { year: false, forward: true }]
            } else if sel == m.picker_ok {
                vec![Element::PickerOk]
            } else {
                sel.strip_prefix("td[title=\"")
                    .and_then(|rest| rest.strip_suffix("\"]"))
                    .and_then(|title| NaiveDate::parse_from_str(title, "%Y-%m-%d").ok())
                    .filter(|day| (day.year(), day.month0()) == state.shown)
                    .filter(|day| !script.missing.contains(day))
                    .map(Element::Day)
                    .into_iter()
                    .collect()
            }
        } else if sel == m.username_input {
            vec![Element::UsernameInput]
        } else if sel == m.password_input {
            vec![Element::PasswordInput]
        } else if sel == m.login_button {
            vec![Element::LoginButton]
        } else if sel == m.any_element {
            let mut texts = Vec::new();
            if state.logged_in && script.accept_login {
                texts.push(Element::Text(m.login_prompt.clone()));
                texts.push(Element::Text(DEFAULT_JOB_CONTEXT.into()));
            }
            if state.menu_open {
                texts.push(Element::Text(m.monitoring_entry_text.clone()));
            }
            texts
        } else if sel == m.menu_toggle {
            if state.context_selected {
                vec![Element::MenuToggle]
            } else {
                Vec::new()
            }
        } else if sel == m.menu_ready {
            if state.menu_open {
                vec![Element::MenuReady]
            } else {
                Vec::new()
            }
        } else if sel == m.more_button {
            if state.monitoring_open {
                vec![Element::MoreButton]
            } else {
                Vec::new()
            }
        } else if sel == m.field_label {
            vec![
                Element::Label {
                    text: m.ticket_type_label.clone(),
                    target: TICKET_TYPE_CONTROL.into(),
                },
                Element::Label {
                    text: "Accept Time".into(),
                    target: "BEGIN_ACCEPT_TIME".into(),
                },
            ]
        } else if sel == format!(r#"[id="{TICKET_TYPE_CONTROL}"]"#) && target.climb_target().is_some() {
            vec![Element::SelectTrigger]
        } else if sel == m.select_option {
            if state.dropdown_open {
                script.options.iter().cloned().map(Element::Option).collect()
            } else {
                Vec::new()
            }
        } else if sel == m.start_date_input || sel == m.end_date_input {
            vec![Element::DateInput, Element::DateInput]
        } else if sel == m.picker_popup {
            if state.popup_open {
                vec![Element::Popup]
            } else {
                Vec::new()
            }
        } else if sel == m.status_radio {
            script.radios.iter().cloned().map(Element::Radio).collect()
        } else if sel == m.query_button {
            vec![Element::QueryButton]
        } else if sel == m.results_marker {
            if state.query_submitted && script.show_results {
                vec![Element::ResultsMarker]
            } else {
                Vec::new()
            }
        } else if sel == m.export_icon {
            if state.results_opened {
                vec![Element::ExportIcon]
            } else {
                Vec::new()
            }
        } else if sel == m.export_menu_item {
            if state.export_menu_open {
                vec![Element::ExportItem("CSV".into()), Element::ExportItem("Excel".into())]
            } else {
                Vec::new()
            }
        } else {
            Vec::new()
        };

        if let Some(filter) = target.text_filter() {
            found.retain(|element| filter.matches(&self.element_text(element)));
        }
        found
    }

    fn resolve(&self, state: &FakeState, target: &Locator) -> Result<Element, BrowserError> {
        self.candidates(state, target)
            .get(target.index())
            .cloned()
            .ok_or_else(|| BrowserError::ElementNotFound(target.to_string()))
    }

    fn page(&self, state: &mut FakeState, year: bool, forward: bool) {
        let (y, m) = &mut state.shown;
        match (year, forward) {
            (true, true) => *y += 1,
            (true, false) => *y -= 1,
            (false, true) if *m == 11 => {
                *m = 0;
                *y += 1;
            },
            (false, true) => *m += 1,
            (false, false) if *m == 0 => {
                *m = 11;
                *y -= 1;
            },
            (false, false) => *m -= 1,
        }
        if year {
            state.year_pages += 1;
        } else {
            state.month_pages += 1;
        }
    }
}

#[async_trait]
impl PageDriver for FakePortal {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.state.lock().unwrap().calls.push(format!("goto {url}"));
        Ok(())
    }

    async fn fill(&self, target: &Locator, value: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("fill {target}"));
        self.resolve(&state, target)?;
        state
            .filled
            .insert(target.selector().to_string(), value.to_string());
        Ok(())
    }

    async fn click(&self, target: &Locator) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("click {target}"));
        if self.script.fail_clicks_on.as_deref() == Some(target.selector()) {
            return Err(BrowserError::Cdp("scripted click failure".into()));
        }
        match self.resolve(&state, target)? {
            Element::LoginButton => state.logged_in = true,
            Element::MenuToggle => state.menu_open = true,
            Element::Text(text) if text == self.markup.monitoring_entry_text => {
                state.menu_open = false;
                state.monitoring_open = true;
            },
            Element::MoreButton => state.filter_panel_open = true,
            Element::Option(option) => {
                state.selected_option = Some(option);
                state.dropdown_open = false;
            },
            Element::DateInput => state.popup_open = true,
            Element::Pager { year, forward } => self.page(&mut state, year, forward),
            Element::Day(day) => state.pending_day = Some(day),
            Element::PickerOk => {
                if let Some(day) = state.pending_day.take() {
                    state.committed.push(day);
                }
                state.popup_open = false;
            },
            Element::Radio(label) => state.selected_radio = Some(label),
            Element::QueryButton => state.query_submitted = true,
            Element::ResultsMarker => state.results_opened = true,
            Element::ExportIcon => state.export_menu_open = true,
            _ => {},
        }
        Ok(())
    }

    async fn double_click(&self, target: &Locator) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("double_click {target}"));
        if self.resolve(&state, target)? == Element::Text(DEFAULT_JOB_CONTEXT.into()) {
            state.context_selected = true;
        }
        Ok(())
    }

    async fn activate(&self, target: &Locator) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("activate {target}"));
        if self.resolve(&state, target)? == Element::SelectTrigger {
            state.dropdown_open = true;
        }
        Ok(())
    }

    async fn count(&self, target: &Locator) -> Result<usize, BrowserError> {
        let state = self.state.lock().unwrap();
        Ok(self.candidates(&state, target).len())
    }

    async fn text(&self, target: &Locator) -> Result<String, BrowserError> {
        let state = self.state.lock().unwrap();
        let text = match self.resolve(&state, target)? {
            Element::YearLabel => state.shown.0.to_string(),
            Element::MonthLabel => self.script.month_label_override.clone().unwrap_or_else(|| {
                MONTH_LABELS[usize::try_from(state.shown.1).unwrap()].to_string()
            }),
            other => self.element_text(&other),
        };
        Ok(text)
    }

    async fn attribute(
        &self,
        target: &Locator,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let state = self.state.lock().unwrap();
        let value = match (self.resolve(&state, target)?, name) {
            (Element::Label { target, .. }, "for") => Some(target),
            (Element::Day(day), "class") => {
                let mut class = "ant-picker-cell ant-picker-cell-in-view".to_string();
                if self.script.disabled.contains(&day) {
                    class.push(' ');
                    class.push_str(&self.markup.picker_disabled_class);
                }
                Some(class)
            },
            _ => None,
        };
        Ok(value)
    }

    async fn wait_for(&self, target: &Locator, _budget: Duration) -> Result<(), BrowserError> {
        let state = self.state.lock().unwrap();
        if self.candidates(&state, target).len() > target.index() {
            Ok(())
        } else {
            Err(BrowserError::Timeout(format!("{target} never appeared")))
        }
    }

    async fn wait_for_quiescence(&self, _budget: Duration) -> Result<(), BrowserError> {
        self.state.lock().unwrap().calls.push("quiescence".into());
        Ok(())
    }

    async fn click_and_download(
        &self,
        target: &Locator,
        _budget: Duration,
    ) -> Result<Download, BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("download {target}"));
        let Element::ExportItem(_) = self.resolve(&state, target)? else {
            return Err(BrowserError::InvalidAction(format!("{target} is not an export entry")));
        };
        if self.script.cancel_download {
            return Err(BrowserError::DownloadFailed("download was cancelled".into()));
        }
        state.downloads += 1;
        Ok(Download {
            suggested_filename: Some("tickets.csv".into()),
            bytes: self.script.download.clone(),
        })
    }

    async fn close(&self) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("close".into());
        state.closes += 1;
        if self.script.fail_close {
            return Err(BrowserError::BrowserClosed);
        }
        Ok(())
    }
}

/// Hands out a fresh [`FakePortal`] per launch and keeps handles to all of
/// them.
#[derive(Clone)]
pub(crate) struct FakeLauncher {
    script: FakePortalBuilder,
    failure: Arc<Mutex<Option<BrowserError>>>,
    launched: Arc<Mutex<Vec<FakePortal>>>,
}

impl FakeLauncher {
    pub fn new(script: FakePortalBuilder) -> Self {
        Self {
            script,
            failure: Arc::new(Mutex::new(None)),
            launched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(err: BrowserError) -> Self {
        let launcher = Self::new(FakePortal::builder());
        *launcher.failure.lock().unwrap() = Some(err);
        launcher
    }

    pub fn total_closes(&self) -> usize {
        self.launched
            .lock()
            .unwrap()
            .iter()
            .map(|portal| portal.state().closes)
            .sum()
    }

    /// Calls recorded by the most recent session.
    pub fn calls(&self) -> Vec<String> {
        self.launched
            .lock()
            .unwrap()
            .last()
            .map(FakePortal::calls)
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn PageDriver>, BrowserError> {
        let failure = self.failure.lock().unwrap().take();
        if let Some(err) = failure {
            return Err(err);
        }
        let portal = self.script.clone().build();
        self.launched.lock().unwrap().push(portal.clone());
        Ok(Box::new(portal))
    }
}
