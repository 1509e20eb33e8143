// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Library page — pick a local PDF or enter a link, then open it in the viewer.

use dioxus::prelude::*;

use crate::Route;
use crate::services::app_services::AppServices;
use crate::state::AppState;

#[component]
pub fn Library() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let mut url_input = use_signal(String::new);
    let nav = navigator();

    rsx! {
        div {
            h1 { "Library" }
            p { style: "color: #666;",
                "Documents open read-only. Copying, printing, and saving are blocked, and every page carries your name."
            }

            section { style: "margin: 16px 0; display: flex; gap: 8px; flex-wrap: wrap;",
                button {
                    style: "padding: 12px 24px; border-radius: 8px; border: 1px solid #007aff; color: #007aff; background: white; font-size: 16px;",
                    onclick: {
                        let svc = svc.clone();
                        move |_| {
                            #[cfg(not(any(target_os = "ios", target_os = "android")))]
                            {
                                let Some(path) = rfd::FileDialog::new()
                                    .add_filter("PDF documents", &["pdf"])
                                    .pick_file()
                                else {
                                    return;
                                };
                                match svc.describe_file(&path) {
                                    Ok(descriptor) => {
                                        tracing::info!(file = %path.display(), "document opened");
                                        state.write().open(descriptor);
                                        state.write().status_message = None;
                                        nav.push(Route::Viewer {});
                                    }
                                    Err(e) => {
                                        tracing::error!(error = %e, "failed to read document");
                                        state.write().status_message =
                                            Some(format!("Could not open that file. {e}"));
                                    }
                                }
                            }
                            #[cfg(any(target_os = "ios", target_os = "android"))]
                            {
                                state.write().status_message =
                                    Some("Open documents from a link on this device.".into());
                            }
                        }
                    },
                    "Open PDF..."
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Open a link" }
                div { style: "display: flex; gap: 8px;",
                    input {
                        r#type: "url",
                        placeholder: "https://example.org/handbook.pdf",
                        style: "flex: 1; padding: 8px; border: 1px solid #ccc; border-radius: 6px;",
                        value: "{url_input}",
                        oninput: move |evt| url_input.set(evt.value()),
                    }
                    button {
                        style: "padding: 8px 16px; border-radius: 6px; border: none; background: #007aff; color: white;",
                        disabled: url_input.read().trim().is_empty(),
                        onclick: {
                            let svc = svc.clone();
                            move |_| {
                                let url = url_input.read().trim().to_owned();
                                let descriptor = svc.describe_url(&url);
                                state.write().open(descriptor);
                                url_input.set(String::new());
                                nav.push(Route::Viewer {});
                            }
                        },
                        "View"
                    }
                }
            }

            if let Some(ref msg) = state.read().status_message {
                div { style: "padding: 12px; border-radius: 8px; background: #f8d7da; color: #721c24; margin: 8px 0;",
                    "{msg}"
                }
            }

            section { style: "margin: 24px 0;",
                h3 { "Recently opened" }
                if state.read().library.is_empty() {
                    p { style: "text-align: center; color: #aaa; margin: 32px 0;",
                        "Nothing opened yet."
                    }
                }
                for descriptor in state.read().library.clone() {
                    {
                        let pages = descriptor
                            .page_count
                            .map(|n| format!("{n} pages"))
                            .unwrap_or_default();
                        let location = descriptor
                            .locator
                            .as_ref()
                            .map(|l| l.to_string())
                            .unwrap_or_default();
                        let reopen = descriptor.clone();
                        rsx! {
                            div {
                                key: "{descriptor.id}",
                                style: "display: flex; justify-content: space-between; align-items: center; padding: 10px; margin: 4px 0; border: 1px solid #f0f0f0; border-radius: 6px;",
                                div {
                                    strong { "{descriptor.title}" }
                                    p { style: "color: #888; font-size: 12px; margin: 2px 0 0;",
                                        "{location} {pages}"
                                    }
                                }
                                button {
                                    style: "padding: 6px 12px; border-radius: 4px; border: 1px solid #ccc; background: white;",
                                    onclick: move |_| {
                                        state.write().open(reopen.clone());
                                        nav.push(Route::Viewer {});
                                    },
                                    "View"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
