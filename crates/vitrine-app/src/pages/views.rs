// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Views page — the append-only view log backed by SQLite.

use dioxus::prelude::*;

use vitrine_security::view_log::ViewEntry;

use crate::services::app_services::AppServices;
use crate::state::AppState;

const REFRESH: std::time::Duration = std::time::Duration::from_secs(5);

#[component]
pub fn Views() -> Element {
    let svc = use_context::<AppServices>();
    let state = use_context::<Signal<AppState>>();
    let mut entries = use_signal(Vec::<ViewEntry>::new);

    let svc_load = svc.clone();
    let _loader = use_resource(move || {
        let svc = svc_load.clone();
        async move {
            loop {
                match svc.recent_views(100) {
                    Ok(recent) => entries.set(recent),
                    Err(e) => tracing::warn!(error = %e, "could not read the view log"),
                }
                tokio::time::sleep(REFRESH).await;
            }
        }
    });

    rsx! {
        div {
            div { style: "display: flex; justify-content: space-between; align-items: center;",
                h1 { "Views" }
                {
                    let count = entries.read().len();
                    rsx! {
                        span { style: "color: #666; font-size: 14px;", "{count} recent" }
                    }
                }
            }
            p { style: "color: #666;",
                "Every time a document is opened, the viewer and time are recorded here."
            }

            if entries.read().is_empty() {
                p { style: "text-align: center; color: #aaa; margin: 48px 0;",
                    "No views recorded yet."
                }
            } else {
                div { style: "margin-top: 16px;",
                    for entry in entries.read().iter() {
                        {
                            let title = state
                                .read()
                                .library
                                .iter()
                                .find(|d| d.id.to_string() == entry.document_id)
                                .map(|d| d.title.clone())
                                .unwrap_or_else(|| short_id(&entry.document_id));
                            let viewer = short_id(&entry.viewer_id);

                            rsx! {
                                div {
                                    key: "{entry.id}",
                                    style: "padding: 10px; margin: 4px 0; border: 1px solid #f0f0f0; border-radius: 6px; font-size: 14px;",
                                    div { style: "display: flex; justify-content: space-between; align-items: center;",
                                        strong { "{title}" }
                                        span { style: "color: #999; font-size: 12px;", "{entry.viewed_at}" }
                                    }
                                    p { style: "color: #888; font-size: 12px; margin: 2px 0 0; font-family: monospace;",
                                        "viewer {viewer}"
                                    }
                                    if let Some(ref ip) = entry.ip_address {
                                        p { style: "color: #666; font-size: 12px; margin: 2px 0 0;",
                                            "from {ip}"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn short_id(id: &str) -> String {
    if id.len() > 8 {
        format!("{}...", &id[..8])
    } else {
        id.to_owned()
    }
}
