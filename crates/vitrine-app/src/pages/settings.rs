// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Settings page — viewer profile and persistent viewer configuration.

use dioxus::prelude::*;

use crate::services::app_services::AppServices;
use crate::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const ROW: &str = "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;";
const FIELD: &str = "width: 120px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px; text-align: right;";

#[component]
pub fn Settings() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let mut save_msg = use_signal(|| Option::<String>::None);

    rsx! {
        div {
            h1 { "Settings" }

            section { style: "margin: 16px 0;",
                h3 { "Profile" }
                p { style: "color: #666; font-size: 14px;",
                    "Your name and the current time are printed across every document you view."
                }
                div { style: ROW,
                    span { "Email" }
                    input {
                        r#type: "email",
                        style: "width: 220px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: "{state.read().identity.email}",
                        onchange: move |evt| state.write().identity.email = evt.value(),
                    }
                }
                div { style: ROW,
                    span { "Display name" }
                    input {
                        style: "width: 220px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: state.read().identity.display_name.clone().unwrap_or_default(),
                        onchange: move |evt| {
                            let name = evt.value();
                            state.write().identity.display_name =
                                if name.trim().is_empty() { None } else { Some(name) };
                        },
                    }
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Watermark" }
                NumberRow {
                    label: "Spacing (px)",
                    value: f64::from(state.read().config.watermark.spacing),
                    on_change: move |v: f64| {
                        if v >= 1.0 {
                            state.write().config.watermark.spacing = v as u32;
                        }
                    },
                }
                NumberRow {
                    label: "Margin (px)",
                    value: f64::from(state.read().config.watermark.margin),
                    on_change: move |v: f64| {
                        if v >= 0.0 {
                            state.write().config.watermark.margin = v as u32;
                        }
                    },
                }
                NumberRow {
                    label: "Jitter (px)",
                    value: state.read().config.watermark.jitter,
                    on_change: move |v: f64| {
                        let half_cell = f64::from(state.read().config.watermark.spacing) / 2.0;
                        if v.is_finite() && (0.0..=half_cell).contains(&v) {
                            state.write().config.watermark.jitter = v;
                        }
                    },
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Viewer" }
                NumberRow {
                    label: "Reading speed",
                    value: f64::from(state.read().config.speech_rate),
                    on_change: move |v: f64| {
                        if (0.1..=10.0).contains(&v) {
                            state.write().config.speech_rate = v as f32;
                        }
                    },
                }
                NumberRow {
                    label: "Resize settle delay (ms)",
                    value: state.read().config.resize_debounce_ms as f64,
                    on_change: move |v: f64| {
                        if v >= 0.0 {
                            state.write().config.resize_debounce_ms = v as u64;
                        }
                    },
                }
                NumberRow {
                    label: "Text extraction timeout (s)",
                    value: state.read().config.extraction_timeout_secs as f64,
                    on_change: move |v: f64| {
                        if v >= 1.0 {
                            state.write().config.extraction_timeout_secs = v as u64;
                        }
                    },
                }
                SettingRow {
                    label: "Page-by-page layout",
                    checked: state.read().config.force_compact_layout,
                    on_toggle: move |v: bool| { state.write().config.force_compact_layout = v; },
                }
                SettingRow {
                    label: "Record document views",
                    checked: state.read().config.view_logging_enabled,
                    on_toggle: move |v: bool| { state.write().config.view_logging_enabled = v; },
                }
            }

            button {
                style: "width: 100%; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white; font-size: 16px; margin-top: 8px;",
                onclick: {
                    let svc = svc.clone();
                    move |_| {
                        let (config, identity) = {
                            let state = state.read();
                            (state.config.clone(), state.identity.clone())
                        };
                        let result = svc
                            .save_config(&config)
                            .and_then(|()| svc.save_identity(&identity));
                        match result {
                            Ok(()) => {
                                tracing::info!("settings saved");
                                save_msg.set(Some("Settings saved. They apply to the next document you open.".into()));
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "failed to save settings");
                                save_msg.set(Some(format!("Save failed: {e}")));
                            }
                        }
                    }
                },
                "Save Settings"
            }
            if let Some(ref msg) = *save_msg.read() {
                p { style: "color: #34c759; font-size: 14px; text-align: center; margin-top: 8px;",
                    "{msg}"
                }
            }

            section { style: "margin: 24px 0;",
                h3 { "About" }
                p { style: "color: #666; font-size: 14px;",
                    "Vitrine v{VERSION}"
                    br {}
                    "Protected document viewer"
                    br {}
                    "PMPL-1.0-or-later"
                }
            }
        }
    }
}

#[component]
fn SettingRow(label: &'static str, checked: bool, on_toggle: EventHandler<bool>) -> Element {
    rsx! {
        div { style: ROW,
            span { "{label}" }
            input {
                r#type: "checkbox",
                checked: checked,
                onchange: move |evt| {
                    on_toggle.call(evt.checked());
                },
            }
        }
    }
}

#[component]
fn NumberRow(label: &'static str, value: f64, on_change: EventHandler<f64>) -> Element {
    rsx! {
        div { style: ROW,
            span { "{label}" }
            input {
                r#type: "number",
                style: FIELD,
                value: "{value}",
                onchange: move |evt| {
                    if let Ok(v) = evt.value().parse::<f64>() {
                        on_change.call(v);
                    }
                },
            }
        }
    }
}
