use std::{sync::Arc, time::Duration};

use eframe::{
    App, CreationContext, Frame,
    egui::{self, Color32, Context, Margin, RichText, Stroke},
};
use egui_extras::{Size, StripBuilder};
use tracing::warn;

use crate::{
    config::Config,
    controller::{FeedBody, FeedController, NavButton},
    domain::{BadgeStyle, EventCard},
    feed::EventSource,
    storage::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore},
    theme::ThemeManager,
};

pub const APP_NAME: &str = "Activity Feed";

const PENDING_REPAINT_INTERVAL: Duration = Duration::from_millis(100);
const NAV_BUTTON_WIDTH: f32 = 96.0;

pub struct FeedApp {
    feed: FeedController,
    theme: ThemeManager,
    storage_warning: Option<String>,
}

impl FeedApp {
    pub fn new(cc: &CreationContext<'_>, config: &Config, source: Arc<dyn EventSource>) -> Self {
        let (store, mut storage_warning) = open_preference_store(config);

        let mut theme = ThemeManager::new(store);
        if let Err(err) = theme.initialize(&cc.egui_ctx) {
            warn!(error = %err, "failed to read saved theme preference");
            storage_warning = Some(format!("Failed to restore saved theme: {err}"));
        }

        let mut feed = FeedController::new(source);
        feed.load(feed.page());

        Self {
            feed,
            theme,
            storage_warning,
        }
    }

    fn dispatch(&mut self, ctx: &Context, actions: Vec<UiAction>) {
        for action in actions {
            match action {
                UiAction::NextPage => self.feed.advance(),
                UiAction::PreviousPage => self.feed.retreat(),
                UiAction::ThemeToggled(checked) => {
                    if let Err(err) = self.theme.on_toggle(checked, ctx) {
                        warn!(error = %err, "failed to persist theme preference");
                        self.storage_warning =
                            Some(format!("Theme preference was not saved: {err}"));
                    }
                }
            }
        }
    }

    fn render_header(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.horizontal(|row| {
            row.heading(APP_NAME);
            row.with_layout(egui::Layout::right_to_left(egui::Align::Center), |lane| {
                let mut checked = self.theme.toggle_checked();
                if lane.checkbox(&mut checked, "Dark mode").changed() {
                    actions.push(UiAction::ThemeToggled(checked));
                }
            });
        });

        let view = self.feed.view();
        ui.horizontal(|row| {
            if let Some(total) = view.total_count {
                row.weak(format!("{total} events recorded"));
            }
            match view.synced_at {
                Some(at) => row.weak(format!("Last synced {} UTC", at.format("%H:%M:%S"))),
                None => row.weak("Not synced yet."),
            };
            if self.feed.is_fetching() {
                row.spinner();
            }
        });

        if let Some(warning) = &self.storage_warning {
            ui.colored_label(ui.visuals().warn_fg_color, warning);
        }
    }

    fn render_feed(&mut self, ui: &mut egui::Ui) {
        let scroll = self.feed.take_scroll_request();
        egui::ScrollArea::vertical().show(ui, |area| {
            let top = area.allocate_response(egui::Vec2::ZERO, egui::Sense::hover());
            if scroll {
                top.scroll_to_me(Some(egui::Align::TOP));
            }

            match &self.feed.view().body {
                FeedBody::Loading => {
                    area.weak("Loading activity…");
                }
                FeedBody::Empty(message) => render_placeholder(area, message),
                FeedBody::Error(message) => {
                    area.colored_label(area.visuals().error_fg_color, message);
                }
                FeedBody::Cards(cards) => {
                    for (idx, card) in cards.iter().enumerate() {
                        area.push_id((idx, card.style_category.as_str()), |ui| {
                            render_event_card(ui, card);
                        });
                    }
                }
            }
        });
    }

    fn render_pagination(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let view = self.feed.view();
        StripBuilder::new(ui)
            .size(Size::exact(NAV_BUTTON_WIDTH))
            .size(Size::remainder())
            .size(Size::exact(NAV_BUTTON_WIDTH))
            .horizontal(|mut strip| {
                strip.cell(|ui| {
                    if nav_button(ui, "Previous", view.previous) {
                        actions.push(UiAction::PreviousPage);
                    }
                });
                strip.cell(|ui| {
                    ui.centered_and_justified(|center| {
                        center.strong(&view.page_label);
                    });
                });
                strip.cell(|ui| {
                    if nav_button(ui, "Next", view.next) {
                        actions.push(UiAction::NextPage);
                    }
                });
            });
    }
}

impl App for FeedApp {
    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        self.feed.poll();

        let mut actions = Vec::new();

        egui::TopBottomPanel::top("header_panel").show(ctx, |ui| {
            self.render_header(ui, &mut actions);
        });

        egui::TopBottomPanel::bottom("pagination_panel")
            .exact_height(36.0)
            .show(ctx, |ui| {
                self.render_pagination(ui, &mut actions);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_feed(ui);
        });

        self.dispatch(ctx, actions);

        if self.feed.is_fetching() {
            ctx.request_repaint_after(PENDING_REPAINT_INTERVAL);
        }
    }
}

fn open_preference_store(config: &Config) -> (Box<dyn PreferenceStore>, Option<String>) {
    let opened = match &config.storage.dir {
        Some(dir) => FilePreferenceStore::at(dir),
        None => FilePreferenceStore::initialize(),
    };
    match opened {
        Ok(store) => {
            let store: Box<dyn PreferenceStore> = Box::new(store);
            (store, None)
        }
        Err(err) => {
            warn!(error = %err, "preference storage unavailable; using session-only store");
            (
                Box::new(MemoryPreferenceStore::default()),
                Some(format!(
                    "Preference storage is unavailable; the theme will not persist ({err})."
                )),
            )
        }
    }
}

// -----------------------------------------------------------------------------
// UI helpers
// -----------------------------------------------------------------------------

fn nav_button(ui: &mut egui::Ui, label: &str, state: NavButton) -> bool {
    ui.scope(|ui| {
        ui.set_opacity(state.opacity());
        ui.add_enabled(state.enabled, egui::Button::new(label))
            .clicked()
    })
    .inner
}

fn render_placeholder(ui: &mut egui::Ui, message: &str) {
    egui::Frame::group(ui.style())
        .inner_margin(Margin::same(16))
        .show(ui, |frame| {
            frame.set_width(frame.available_width());
            frame.vertical_centered(|center| {
                center.weak(message);
            });
        });
}

fn render_event_card(ui: &mut egui::Ui, card: &EventCard) {
    let accent = accent_color(&card.style_category);
    egui::Frame::group(ui.style())
        .stroke(Stroke::new(1.0, accent))
        .inner_margin(Margin::same(12))
        .show(ui, |frame| {
            frame.set_width(frame.available_width());
            frame.horizontal(|row| {
                row.strong(&card.author);
                row.with_layout(egui::Layout::right_to_left(egui::Align::Center), |lane| {
                    render_badge(lane, &card.action, card.badge, accent);
                });
            });
            frame.add_space(6.0);
            frame.horizontal(|row| {
                row.label("From");
                row.label(RichText::new(&card.from_branch).code());
                row.label("to");
                row.label(RichText::new(&card.to_branch).code());
            });
            frame.separator();
            frame.small(&card.timestamp);
        });
    ui.add_space(10.0);
}

fn render_badge(ui: &mut egui::Ui, label: &str, style: BadgeStyle, accent: Color32) {
    let (fill, text) = match style {
        BadgeStyle::Primary => (
            accent,
            RichText::new(label).small().strong().color(Color32::WHITE),
        ),
        BadgeStyle::Outline => (
            Color32::TRANSPARENT,
            RichText::new(label).small().color(accent),
        ),
    };
    egui::Frame::new()
        .fill(fill)
        .stroke(Stroke::new(1.0, accent))
        .inner_margin(Margin::symmetric(6, 2))
        .show(ui, |badge| {
            badge.label(text);
        });
}

fn accent_color(style_category: &str) -> Color32 {
    match style_category {
        "push" => Color32::from_rgb(59, 130, 246),
        "merge" => Color32::from_rgb(139, 92, 246),
        "pullrequest" => Color32::from_rgb(16, 185, 129),
        _ => Color32::GRAY,
    }
}

// -----------------------------------------------------------------------------
// Supporting types
// -----------------------------------------------------------------------------

enum UiAction {
    NextPage,
    PreviousPage,
    ThemeToggled(bool),
}
