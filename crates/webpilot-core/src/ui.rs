//! Interface for UI output and the human-in-the-loop channel.
//!
//! Abstracts console presentation away from the control loop so the core
//! stays testable and alternative front ends stay possible.

use crate::protocol::Action;

pub trait UiWriter: Send + Sync {
    /// Print a plain message
    fn print(&self, message: &str);

    /// Announce the goal at run start
    fn print_goal(&self, goal: &str);

    /// Rule off a new decision cycle
    fn print_step_header(&self, step: u32, max_steps: u32);

    /// Show the page address observed this cycle
    fn print_url(&self, url: &str);

    /// Indicate the decision call is in flight
    fn print_thinking(&self);

    /// Surface the validated action the decision step chose
    fn print_decision(&self, action: &Action);

    /// Surface an action result before the next cycle begins
    fn print_result(&self, message: &str);

    /// Surface the final summary of a successful run
    fn print_finished(&self, summary: &str);

    /// Surface the reason an aborted run ended
    fn print_aborted(&self, reason: &str);

    /// Present a question and block for a free-text answer. Only used for
    /// `ask_user`; the loop suspends until this returns.
    fn prompt_user_answer(&self, question: &str) -> String;
}

/// A no-op implementation for when UI output is not needed
pub struct NullUiWriter;

impl UiWriter for NullUiWriter {
    fn print(&self, _message: &str) {}
    fn print_goal(&self, _goal: &str) {}
    fn print_step_header(&self, _step: u32, _max_steps: u32) {}
    fn print_url(&self, _url: &str) {}
    fn print_thinking(&self) {}
    fn print_decision(&self, _action: &Action) {}
    fn print_result(&self, _message: &str) {}
    fn print_finished(&self, _summary: &str) {}
    fn print_aborted(&self, _reason: &str) {}
    fn prompt_user_answer(&self, _question: &str) -> String {
        String::new()
    }
}
