// Colored terminal rendering of the widget state.
//
// This is the demo binary's stand-in for the real DOM rendering layer: it
// draws whatever the state machine's snapshot says, tinted by the gradient
// color, and never reaches into the machine itself.

use colored::Colorize;

use crate::config::{LoadingIconStyle, WidgetConfig};
use crate::widget::machine::WidgetSnapshot;
use crate::widget::state::{feedback_text_index, Emoji, Shape};

fn shape_glyph(shape: Shape) -> &'static str {
    match shape {
        Shape::Circle => "●",
        Shape::Square => "■",
        Shape::Diamond => "◆",
    }
}

fn emoji_glyph(emoji: Emoji) -> &'static str {
    match emoji {
        Emoji::Smile => "🙂",
        Emoji::Neutral => "😐",
        Emoji::Sad => "🙁",
    }
}

/// Render the current widget snapshot as a single status line plus any
/// feedback text below it.
pub fn display_indicator(snapshot: &WidgetSnapshot, config: &WidgetConfig) {
    if let Some(message) = &snapshot.error_message {
        println!("  {}", message.red());
        return;
    }

    if snapshot.state.is_playing_loading_animation {
        println!("  {}", "scoring…".dimmed());
        return;
    }

    let mut line = String::from("  ");

    if !snapshot.state.hide_indicator {
        let glyph = match config.loading_icon_style {
            LoadingIconStyle::Shape => shape_glyph(snapshot.state.shape),
            LoadingIconStyle::Emoji => emoji_glyph(snapshot.state.emoji),
        };
        let color = snapshot.color;
        line.push_str(&format!(
            "{} ",
            glyph.truecolor(color.r, color.g, color.b).bold()
        ));
    }

    if config.show_percentage {
        line.push_str(&format!("{:>3.0}%  ", snapshot.score * 100.0));
    }

    if let Some(index) = feedback_text_index(snapshot.score, &config.score_thresholds) {
        line.push_str(&config.feedback_text[index]);
    }

    println!("{line}");

    if snapshot.show_feedback_prompt {
        println!("  {}", config.user_feedback_prompt_text.dimmed());
    }
    if config.show_more_info_link {
        println!("  {}", "(type /info for model info)".dimmed());
    }
}
