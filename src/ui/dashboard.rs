use chrono::Local;
use gtk4::prelude::*;
use libadwaita::prelude::*;

use crate::render::{DisplaySurface, StatusView};

const ALARM_ACTIVE_CLASS: &str = "alarm-active";
const WARNING_CLASS: &str = "warning";

/// Handles returned from building the dashboard window.
#[derive(Clone)]
pub struct DashboardWidgets {
    pub window: libadwaita::ApplicationWindow,
    pub count_label: gtk4::Label,
    pub alarm_card: gtk4::Box,
    pub alarm_status_label: gtk4::Label,
    pub alarm_text_label: gtk4::Label,
    pub threshold_bar: gtk4::ProgressBar,
    pub threshold_label: gtk4::Label,
    pub updated_label: gtk4::Label,
}

impl DisplaySurface for DashboardWidgets {
    fn show(&self, view: &StatusView) {
        self.count_label.set_text(&view.count);

        self.alarm_status_label.set_text(&view.alarm_status);
        self.alarm_text_label.set_text(&view.alarm_text);
        if view.alarm_active {
            self.alarm_card.add_css_class(ALARM_ACTIVE_CLASS);
        } else {
            self.alarm_card.remove_css_class(ALARM_ACTIVE_CLASS);
        }

        self.threshold_bar.set_fraction(view.bar_fill);
        self.threshold_label.set_text(&view.bar_label);
        if view.warning {
            self.threshold_bar.add_css_class(WARNING_CLASS);
        } else {
            self.threshold_bar.remove_css_class(WARNING_CLASS);
        }

        self.updated_label
            .set_text(&Local::now().format("%H:%M:%S").to_string());
    }
}

fn install_css() {
    let css_provider = gtk4::CssProvider::new();
    css_provider.load_from_string(
        r#"
        .people-count {
            font-size: 48px;
            font-weight: bold;
        }
        .alarm-card {
            border-radius: 12px;
            padding: 12px 16px;
            background-color: alpha(@card_bg_color, 0.8);
        }
        .alarm-card.alarm-active {
            background-color: rgba(220, 40, 40, 0.85);
            color: white;
        }
        .alarm-status {
            font-size: 20px;
            font-weight: bold;
        }
        progressbar.threshold > trough > progress {
            background-color: #2ec27e;
        }
        progressbar.threshold.warning > trough > progress {
            background-color: #e5a50a;
        }
        "#,
    );
    match gtk4::gdk::Display::default() {
        Some(display) => gtk4::style_context_add_provider_for_display(
            &display,
            &css_provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        ),
        None => log::warn!("No display for dashboard styles"),
    }
}

/// Build the main dashboard window.
pub fn build_dashboard(app: &libadwaita::Application, server_url: &str) -> DashboardWidgets {
    install_css();

    let window = libadwaita::ApplicationWindow::builder()
        .application(app)
        .title("Occupancy Monitor")
        .default_width(420)
        .default_height(480)
        .build();

    let toolbar_view = libadwaita::ToolbarView::new();
    let header = libadwaita::HeaderBar::new();
    toolbar_view.add_top_bar(&header);

    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    content.set_margin_start(16);
    content.set_margin_end(16);
    content.set_margin_top(12);
    content.set_margin_bottom(12);

    // --- People count ---
    let count_group = libadwaita::PreferencesGroup::new();
    count_group.set_title("People Detected");
    count_group.set_description(Some(server_url));

    let count_label = gtk4::Label::new(Some("0"));
    count_label.add_css_class("people-count");
    count_label.set_margin_top(8);
    count_label.set_margin_bottom(8);
    count_group.add(&count_label);

    content.append(&count_group);

    // --- Alarm card ---
    let alarm_group = libadwaita::PreferencesGroup::new();
    alarm_group.set_title("Alarm");
    alarm_group.set_margin_top(12);

    let alarm_card = gtk4::Box::new(gtk4::Orientation::Vertical, 4);
    alarm_card.add_css_class("alarm-card");

    let alarm_status_label = gtk4::Label::new(Some("OFF"));
    alarm_status_label.add_css_class("alarm-status");
    alarm_status_label.set_xalign(0.0);

    let alarm_text_label = gtk4::Label::new(Some("Monitoring..."));
    alarm_text_label.set_xalign(0.0);
    alarm_text_label.set_wrap(true);

    alarm_card.append(&alarm_status_label);
    alarm_card.append(&alarm_text_label);
    alarm_group.add(&alarm_card);

    content.append(&alarm_group);

    // --- Threshold bar ---
    let threshold_group = libadwaita::PreferencesGroup::new();
    threshold_group.set_title("Threshold");
    threshold_group.set_margin_top(12);

    let threshold_bar = gtk4::ProgressBar::new();
    threshold_bar.add_css_class("threshold");
    threshold_bar.set_margin_top(4);
    threshold_group.add(&threshold_bar);

    let threshold_label = gtk4::Label::new(Some("Current: 0% of threshold"));
    threshold_label.add_css_class("dim-label");
    threshold_label.set_xalign(0.0);
    threshold_label.set_margin_top(6);
    threshold_group.add(&threshold_label);

    content.append(&threshold_group);
    content.append(&gtk4::Separator::new(gtk4::Orientation::Horizontal));

    // --- Last update ---
    let updated_row = libadwaita::ActionRow::builder()
        .title("Last Update")
        .build();
    let updated_label = gtk4::Label::new(Some("Waiting..."));
    updated_label.add_css_class("dim-label");
    updated_row.add_suffix(&updated_label);

    let status_group = libadwaita::PreferencesGroup::new();
    status_group.set_margin_top(12);
    status_group.add(&updated_row);
    content.append(&status_group);

    // Assemble
    let scrolled = gtk4::ScrolledWindow::builder()
        .hscrollbar_policy(gtk4::PolicyType::Never)
        .child(&content)
        .build();
    toolbar_view.set_content(Some(&scrolled));
    window.set_content(Some(&toolbar_view));

    DashboardWidgets {
        window,
        count_label,
        alarm_card,
        alarm_status_label,
        alarm_text_label,
        threshold_bar,
        threshold_label,
        updated_label,
    }
}
