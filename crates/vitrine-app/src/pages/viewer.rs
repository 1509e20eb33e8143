// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Viewer page — hosts one `ViewerShell`.
//
// The shell lives as long as this component. DOM events go through the
// bridge registry first (so the input guard sees them), background results
// are pumped on a short interval, and everything shown is read back from the
// shell and the bridge on each render.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dioxus::prelude::*;
use vitrine_bridge::headless::{HeadlessBridge, PresentedContent};
use vitrine_bridge::traits::{InputEvent, SubSurfaceId, SurfaceTarget};
use vitrine_core::human_errors::{HumanError, Severity};
use vitrine_core::types::OverlayLabel;
use vitrine_viewer::{Phase, ViewerCommand, ViewerShell, VoiceControl};

use crate::Route;
use crate::host;
use crate::services::app_services::AppServices;
use crate::state::AppState;

const PUMP_INTERVAL: Duration = Duration::from_millis(40);

/// Handles shared by every event closure on the page.
#[derive(Clone)]
struct Wiring {
    shell: Rc<RefCell<ViewerShell>>,
    bridge: Arc<HeadlessBridge>,
    content: Signal<Option<SubSurfaceId>>,
    measured: Signal<bool>,
    revision: Signal<u64>,
}

impl Wiring {
    fn refresh(&self) {
        let mut revision = self.revision;
        *revision.write() += 1;
    }

    fn root<T: ?Sized>(&self, input: InputEvent, evt: &Event<T>) {
        host::forward(&self.bridge, SurfaceTarget::Root, input, evt);
    }

    fn content<T: ?Sized>(&self, input: InputEvent, evt: &Event<T>) {
        let target = match *self.content.peek() {
            Some(id) => SurfaceTarget::Sub(id),
            None => SurfaceTarget::Root,
        };
        host::forward(&self.bridge, target, input, evt);
    }

    /// Guard first; whatever it lets through may be a viewer shortcut.
    fn key(&self, evt: &KeyboardEvent) {
        let verdict = host::forward(&self.bridge, SurfaceTarget::Root, host::key_input(evt), evt);
        if verdict.prevented {
            return;
        }
        let key = evt.key().to_string();
        if self.shell.borrow_mut().handle_key_command(&key) {
            evt.prevent_default();
            self.refresh();
        }
    }

    fn command(&self, command: ViewerCommand) {
        if self.shell.borrow_mut().dispatch(command) {
            self.refresh();
        }
    }

    fn resize(&self, width: u32, height: u32) {
        self.bridge.resize(width, height);
        let mut measured = self.measured;
        if !*measured.peek() {
            measured.set(true);
            self.shell.borrow_mut().measure(width, height);
            self.refresh();
        }
    }

    fn open_fallback(&self) {
        if let Err(e) = self.shell.borrow().open_fallback() {
            tracing::warn!(error = %e, "no external link for this document");
        }
    }
}

#[component]
pub fn Viewer() -> Element {
    let state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let revision = use_signal(|| 0u64);
    let content = use_signal(|| Option::<SubSurfaceId>::None);
    let measured = use_signal(|| false);

    let wiring = use_hook(|| {
        let mut shell = svc.new_shell();
        if let Some(descriptor) = state.peek().current.clone() {
            shell.mount(descriptor);
        }
        Wiring {
            shell: Rc::new(RefCell::new(shell)),
            bridge: svc.bridge(),
            content,
            measured,
            revision,
        }
    });

    use_future({
        let wiring = wiring.clone();
        move || {
            let wiring = wiring.clone();
            async move {
                loop {
                    tokio::time::sleep(PUMP_INTERVAL).await;
                    let processed = wiring.shell.borrow_mut().pump();
                    if processed > 0 {
                        wiring.refresh();
                    }
                }
            }
        }
    });

    use_drop({
        let bridge = wiring.bridge.clone();
        move || bridge.remove_sub_surface()
    });

    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        use dioxus::desktop::tao::event::{Event as WindowLoopEvent, WindowEvent};
        let bridge = wiring.bridge.clone();
        dioxus::desktop::use_wry_event_handler(move |event, _| {
            if let WindowLoopEvent::WindowEvent {
                event: WindowEvent::Focused(focused),
                ..
            } = event
            {
                bridge.set_foreground(*focused);
            }
        });
    }

    // Subscribe to shell changes.
    let _ = revision();

    let (phase, view, controls, notice, fallback_href, labels, title) = {
        let shell = wiring.shell.borrow();
        (
            shell.phase(),
            shell.view_state().cloned().unwrap_or_default(),
            shell.controls(),
            shell.notice(),
            shell.fallback().and_then(|f| f.href),
            shell.overlay_labels().to_vec(),
            shell.descriptor().map(|d| d.title.clone()).unwrap_or_default(),
        )
    };
    let styles = wiring.bridge.styles();
    let presented = wiring.bridge.content();
    let factor = view.scale.factor();

    if phase == Phase::Unmounted {
        return rsx! {
            div { style: "text-align: center; margin: 64px 0; color: #888;",
                p { "No document is open." }
                Link { to: Route::Library {}, "Choose a document" }
            }
        };
    }

    rsx! {
        for css in styles {
            style { "{css}" }
        }
        div {
            tabindex: "0",
            style: "display: flex; flex-direction: column; height: 100%; outline: none; user-select: none;",
            onmounted: move |evt| async move {
                let _ = evt.set_focus(true).await;
            },
            onkeydown: {
                let w = wiring.clone();
                move |evt: KeyboardEvent| w.key(&evt)
            },
            oncontextmenu: {
                let w = wiring.clone();
                move |evt: MouseEvent| w.root(InputEvent::context_menu(), &evt)
            },
            ondragstart: {
                let w = wiring.clone();
                move |evt: DragEvent| w.root(InputEvent::drag_start(), &evt)
            },
            onselectstart: {
                let w = wiring.clone();
                move |evt: SelectionEvent| w.root(InputEvent::select_start(), &evt)
            },
            ontouchstart: {
                let w = wiring.clone();
                move |evt: TouchEvent| w.root(host::touch_input(&evt), &evt)
            },

            Toolbar {
                title: title,
                controls: controls.clone(),
                on_command: {
                    let w = wiring.clone();
                    move |command: ViewerCommand| w.command(command)
                },
            }

            div {
                style: "position: relative; flex: 1; overflow: auto; background: #f4f4f4;",
                onresize: {
                    let w = wiring.clone();
                    move |evt: ResizeEvent| {
                        if let Ok(size) = evt.get_content_box_size() {
                            w.resize(size.width.max(0.0) as u32, size.height.max(0.0) as u32);
                        }
                    }
                },
                onmounted: {
                    let w = wiring.clone();
                    move |_| {
                        let mut content = w.content;
                        if content.peek().is_none() {
                            content.set(Some(w.bridge.insert_sub_surface()));
                        }
                    }
                },
                onmousedown: {
                    let w = wiring.clone();
                    move |evt: MouseEvent| w.content(host::pointer_input(&evt), &evt)
                },
                ondoubleclick: {
                    let w = wiring.clone();
                    move |evt: MouseEvent| w.content(InputEvent::double_click(), &evt)
                },
                oncontextmenu: {
                    let w = wiring.clone();
                    move |evt: MouseEvent| w.content(InputEvent::context_menu(), &evt)
                },

                div {
                    style: "transform: scale({factor}); transform-origin: top left; width: {100.0 / factor}%; height: {100.0 / factor}%;",
                    {render_content(presented)}
                }

                Overlay { labels: labels }

                if let Some(notice) = notice.clone().filter(HumanError::is_surfaced) {
                    NoticePanel {
                        notice: notice,
                        opaque: !view.visible,
                        href: fallback_href.clone(),
                        on_open: {
                            let w = wiring.clone();
                            move |_| w.open_fallback()
                        },
                    }
                }
            }
        }
    }
}

fn render_content(presented: PresentedContent) -> Element {
    match presented {
        PresentedContent::Nothing => rsx! {},
        PresentedContent::Frame { href, title } => rsx! {
            iframe {
                src: "{href}",
                title: "{title}",
                style: "width: 100%; height: 100%; border: none; background: white;",
            }
        },
        PresentedContent::Pages(pages) => rsx! {
            div { style: "display: flex; flex-direction: column; align-items: center; gap: 12px; padding: 12px;",
                for page in pages {
                    {
                        let (width, height) = page.scaled(1.0);
                        let data = STANDARD.encode(&page.pdf_bytes);
                        rsx! {
                            embed {
                                key: "{page.page_number}",
                                r#type: "application/pdf",
                                src: "data:application/pdf;base64,{data}",
                                width: "{width}",
                                height: "{height}",
                                style: "background: white; box-shadow: 0 1px 4px rgba(0,0,0,0.2);",
                            }
                        }
                    }
                }
            }
        },
    }
}

#[component]
fn Toolbar(title: String, controls: Option<vitrine_viewer::Controls>, on_command: EventHandler<ViewerCommand>) -> Element {
    let button_style = "padding: 6px 12px; border-radius: 6px; border: 1px solid #ccc; background: white; font-size: 14px;";
    rsx! {
        div { style: "display: flex; align-items: center; gap: 8px; padding: 8px; border-bottom: 1px solid #e0e0e0; background: #fafafa;",
            strong { style: "flex: 1; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;", "{title}" }
            if let Some(controls) = controls {
                button {
                    style: button_style,
                    disabled: !controls.can_zoom_out,
                    title: "Zoom out (-)",
                    onclick: move |_| on_command.call(ViewerCommand::ZoomOut),
                    "-"
                }
                span { style: "min-width: 48px; text-align: center; font-size: 14px;", "{controls.zoom_label}" }
                button {
                    style: button_style,
                    disabled: !controls.can_zoom_in,
                    title: "Zoom in (+)",
                    onclick: move |_| on_command.call(ViewerCommand::ZoomIn),
                    "+"
                }
                {
                    match controls.voice {
                        VoiceControl::Hidden => rsx! {},
                        VoiceControl::Pending => rsx! {
                            button { style: button_style, disabled: true, "Preparing text..." }
                        },
                        VoiceControl::Play => rsx! {
                            button {
                                style: button_style,
                                title: "Read aloud (Space)",
                                onclick: move |_| on_command.call(ViewerCommand::ToggleVoice),
                                "Read aloud"
                            }
                        },
                        VoiceControl::Stop => rsx! {
                            button {
                                style: button_style,
                                title: "Stop reading (Esc)",
                                onclick: move |_| on_command.call(ViewerCommand::ToggleVoice),
                                "Stop reading"
                            }
                        },
                    }
                }
            }
        }
    }
}

#[component]
fn Overlay(labels: Vec<OverlayLabel>) -> Element {
    rsx! {
        div {
            "aria-hidden": "true",
            style: "position: absolute; inset: 0; overflow: hidden; pointer-events: none; user-select: none;",
            for label in labels {
                span {
                    key: "{label.key}",
                    style: "position: absolute; left: {label.x}px; top: {label.y}px; transform: translate(-50%, -50%) rotate(-30deg); white-space: nowrap; font-size: 14px; color: rgba(0, 0, 0, 0.14);",
                    "{label.text}"
                }
            }
        }
    }
}

#[component]
fn NoticePanel(notice: HumanError, opaque: bool, href: Option<String>, on_open: EventHandler<()>) -> Element {
    let backdrop = if opaque { "#ffffff" } else { "rgba(255, 255, 255, 0.9)" };
    let accent = match notice.severity {
        Severity::ActionRequired => "#856404",
        Severity::Permanent => "#721c24",
        _ => "#555",
    };
    // `href` is only set once rendering has failed.
    let offer_link = href.is_some() && !opaque;
    rsx! {
        div {
            style: "position: absolute; inset: 0; display: flex; flex-direction: column; align-items: center; justify-content: center; background: {backdrop}; text-align: center; padding: 24px;",
            h3 { style: "color: {accent}; margin: 0 0 8px;", "{notice.message}" }
            p { style: "color: #666; margin: 0 0 16px;", "{notice.suggestion}" }
            if offer_link {
                if let Some(href) = href {
                    a {
                        href: "{href}",
                        target: "_blank",
                        style: "padding: 8px 16px; border-radius: 6px; background: #007aff; color: white; text-decoration: none;",
                        onclick: move |_| on_open.call(()),
                        "Open in browser"
                    }
                }
            }
        }
    }
}
