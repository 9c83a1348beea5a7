use std::io::{self, BufRead, Write};

use webpilot_core::ui::UiWriter;
use webpilot_core::Action;

/// Console implementation of UiWriter that prints to stdout
pub struct ConsoleUiWriter;

impl ConsoleUiWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleUiWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl UiWriter for ConsoleUiWriter {
    fn print(&self, message: &str) {
        println!("{}", message);
    }

    fn print_goal(&self, goal: &str) {
        println!();
        println!("🎯 Goal: {}", goal);
        println!();
    }

    fn print_step_header(&self, step: u32, max_steps: u32) {
        println!();
        println!("━━━━━━━━━━ Step {}/{} ━━━━━━━━━━", step, max_steps);
    }

    fn print_url(&self, url: &str) {
        println!("Current URL: {}", url);
    }

    fn print_thinking(&self) {
        println!("🤔 Thinking...");
    }

    fn print_decision(&self, action: &Action) {
        let rendered = serde_json::to_string(action)
            .unwrap_or_else(|_| format!("{:?}", action));
        println!("🤖 Decided: {}", rendered);
    }

    fn print_result(&self, message: &str) {
        println!("Result: {}", message);
    }

    fn print_finished(&self, summary: &str) {
        println!();
        println!("✅ Task finished: {}", summary);
    }

    fn print_aborted(&self, reason: &str) {
        println!();
        println!("❌ Run aborted: {}", reason);
    }

    fn prompt_user_answer(&self, question: &str) -> String {
        println!();
        println!("✋ Security stop / user question:");
        println!("   {}", question);
        print!("🧑 Your answer > ");
        let _ = io::stdout().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return String::new();
        }
        answer.trim().to_string()
    }
}
