// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vitrine — Protected Document Viewer
//
// Entry point. Initialises logging, backend services, app state, and launches
// the Dioxus UI.

mod host;
mod pages;
mod services;
mod state;

use dioxus::prelude::*;

use pages::library::Library;
use pages::settings::Settings;
use pages::viewer::Viewer;
use pages::views::Views;

use services::app_services::AppServices;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Vitrine starting");

    dioxus::launch(app);
}

/// Top-level route enum.
#[derive(Debug, Clone, Routable, PartialEq)]
enum Route {
    #[layout(TabLayout)]
    #[route("/")]
    Library {},
    #[route("/viewer")]
    Viewer {},
    #[route("/views")]
    Views {},
    #[route("/settings")]
    Settings {},
}

/// Root component.
fn app() -> Element {
    let svc = use_hook(|| match AppServices::init() {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::error!(error = %e, "view log storage failed, using in-memory fallback");
            match AppServices::fallback() {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::error!(error = %e, "in-memory fallback failed");
                    None
                }
            }
        }
    });

    let Some(svc) = svc else {
        return rsx! {
            p { style: "padding: 32px; font-family: system-ui, sans-serif;",
                "Vitrine could not start its storage. Check the log output for details."
            }
        };
    };

    use_context_provider(|| svc.clone());
    use_context_provider(|| Signal::new(state::AppState::new(&svc)));

    rsx! {
        Router::<Route> {}
    }
}

/// Header navigation wrapping all pages. The viewer page needs the full
/// remaining height for its content surface.
#[component]
fn TabLayout() -> Element {
    let current = use_route::<Route>();

    rsx! {
        div { class: "vitrine-shell",
            style: "display: flex; flex-direction: column; height: 100vh; font-family: system-ui, -apple-system, sans-serif;",

            header { class: "vitrine-nav",
                style: "display: flex; align-items: center; gap: 4px; padding: 6px 12px; border-bottom: 1px solid #e0e0e0; background: #fafafa;",
                strong { style: "margin-right: 16px;", "Vitrine" }
                NavTab { to: Route::Library {}, label: "Library", active: (current == Route::Library {}) }
                NavTab { to: Route::Viewer {}, label: "Viewer", active: (current == Route::Viewer {}) }
                NavTab { to: Route::Views {}, label: "Views", active: (current == Route::Views {}) }
                NavTab { to: Route::Settings {}, label: "Settings", active: (current == Route::Settings {}) }
            }

            main {
                style: "flex: 1; min-height: 0; overflow-y: auto; padding: 16px; display: flex; flex-direction: column;",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn NavTab(to: Route, label: &'static str, active: bool) -> Element {
    let weight = if active { "600" } else { "400" };
    let underline = if active { "#007aff" } else { "transparent" };
    rsx! {
        Link { to: to,
            style: "padding: 6px 10px; text-decoration: none; color: #333; font-size: 14px; font-weight: {weight}; border-bottom: 2px solid {underline};",
            "{label}"
        }
    }
}
