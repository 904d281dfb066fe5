//! egui rendering of the card's view tree

use egui::{
    Align, Button, Frame, Layout, Margin, Rect, RichText, Sense, Ui, pos2, vec2,
};
use freshair_card::{Action, CardView, Control, FanView, SpeedBar};

use crate::theme;

/// Draws the card and returns the action of a clicked control, if any
pub fn card_ui(ui: &mut Ui, view: &CardView) -> Option<Action> {
    match view {
        CardView::NotFound { .. } => {
            ui.label(RichText::new(view.placeholder().unwrap_or_default()).color(theme::INACTIVE));
            None
        }
        CardView::Fan(fan) => fan_ui(ui, fan),
    }
}

fn fan_ui(ui: &mut Ui, fan: &FanView) -> Option<Action> {
    let mut clicked = None;

    Frame::group(ui.style())
        .inner_margin(Margin::same(16))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(theme::glyph(&fan.icon))
                        .size(theme::UNIT * 0.6)
                        .color(theme::ICON),
                );
                ui.label(RichText::new(&fan.name).size(theme::UNIT * 0.35));

                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if control_button(ui, &fan.power) {
                        clicked = Some(fan.power.action);
                    }
                    speed_bars(ui, &fan.speed_bars);
                });
            });

            ui.horizontal(|ui| {
                for mode in &fan.modes {
                    if control_button(ui, mode) {
                        clicked = Some(mode.action);
                    }
                }

                // right to left, so the + button ends up outermost
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    for control in [&fan.speed_up, &fan.speed_down] {
                        if control_button(ui, control) {
                            clicked = Some(control.action);
                        }
                    }
                });
            });
        });

    clicked
}

fn control_button(ui: &mut Ui, control: &Control) -> bool {
    let color = theme::control_color(control.style, ui.visuals());

    let button = Button::new(
        RichText::new(theme::glyph(control.icon))
            .size(theme::UNIT * 0.6)
            .color(color),
    )
    .frame(false)
    .min_size(vec2(theme::UNIT, theme::UNIT));

    ui.add(button).on_hover_text(control.title).clicked()
}

fn speed_bars(ui: &mut Ui, bars: &[SpeedBar; 3]) {
    let (rect, _) =
        ui.allocate_exact_size(vec2(theme::UNIT * 1.5, theme::UNIT), Sense::hover());
    let painter = ui.painter_at(rect);
    let width = rect.width() / bars.len() as f32;

    for (i, bar) in bars.iter().enumerate() {
        let left = rect.left() + i as f32 * width;
        let height = rect.height() * bar.height();
        let bar_rect = Rect::from_min_max(
            pos2(left, rect.bottom() - height),
            pos2(left + width - 2., rect.bottom()),
        );

        let color = if bar.active { theme::ICON } else { theme::INACTIVE };
        painter.rect_filled(bar_rect, 0., color);
    }
}
