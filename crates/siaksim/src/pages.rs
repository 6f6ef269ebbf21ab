//! The portal's HTML pages, loaded once at startup.
//!
//! No template engine: the handlers splice into fixed markers exactly the
//! way the mocked portal's pages expect (`<!--CAPTCHA-->`,
//! `<!--LEADERBOARD-->`, the `XXXX` time placeholder).

use std::path::Path;

use anyhow::{Context, Result};
use siaksim_common::LeaderboardRow;
use siaksim_common::constants::{CAPTCHA_MARKER, LEADERBOARD_MARKER, TIME_PLACEHOLDER};

/// Copy swapped on the finish page when the run did not improve.
const FINISH_WIN_COPY: &str = "You have finished in";
const FINISH_LOSS_COPY: &str = "Unfortunately, you did not beat your time in";

/// All pages the portal serves.
pub struct Pages {
    pub index: String,
    pub auth: String,
    pub auth_done: String,
    pub plan: String,
    pub plan_error: String,
    pub plan_empty: String,
    overload: [String; 2],
    pub finish: String,
    pub leaderboard: String,
    pub schedule: String,
}

/// File name of an overload page by its 0/1 id.
pub fn overload_file_name(id: u8) -> String {
    format!("siakOverload{id}.html")
}

impl Pages {
    /// Read every page from `dir`, failing fast on the first missing file.
    pub fn load(dir: &Path) -> Result<Self> {
        let read = |name: &str| -> Result<String> {
            std::fs::read_to_string(dir.join(name))
                .with_context(|| format!("Failed to read page {name}"))
        };
        Ok(Self {
            index: read("index.html")?,
            auth: read("auth.html")?,
            auth_done: read("authDone.html")?,
            plan: read("irs.html")?,
            plan_error: read("irsError.html")?,
            plan_empty: read("irsEmpty.html")?,
            overload: [
                read(&overload_file_name(0))?,
                read(&overload_file_name(1))?,
            ],
            finish: read("finish.html")?,
            leaderboard: read("leaderboard.html")?,
            schedule: read("schedule.html")?,
        })
    }

    pub fn overload(&self, id: u8) -> &str {
        &self.overload[usize::from(id.min(1))]
    }

    /// Plan editor with the Turnstile widget spliced in for humans.
    pub fn plan_with_captcha(&self, site_key: &str) -> String {
        self.plan.replace(
            CAPTCHA_MARKER,
            &format!(r#"<div class="cf-turnstile" data-sitekey="{site_key}"></div><br/>"#),
        )
    }

    /// Finish page with the stored elapsed time, and the losing copy when
    /// the run did not improve.
    pub fn render_finish(&self, time_elapsed: Option<i64>, improved: bool) -> String {
        let time = time_elapsed.map_or_else(|| "?".to_string(), |t| t.to_string());
        let page = self.finish.replace(TIME_PLACEHOLDER, &time);
        if improved {
            page
        } else {
            page.replace(FINISH_WIN_COPY, FINISH_LOSS_COPY)
        }
    }

    /// Leaderboard page with ranked rows spliced in, fastest first.
    pub fn render_leaderboard(&self, rows: &[LeaderboardRow]) -> String {
        let table: Vec<String> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                format!(
                    "<tr class=\"hover:bg-gray-100\">\
                     <td class=\"py-2 px-4 border-b\">{}</td>\
                     <td class=\"py-2 px-4 border-b\">{}</td>\
                     <td class=\"py-2 px-4 border-b\">{}</td></tr>",
                    i + 1,
                    escape_html(&row.name),
                    row.time_elapsed
                )
            })
            .collect();
        self.leaderboard.replace(LEADERBOARD_MARKER, &table.join("\n"))
    }
}

/// Names come from user input and land in HTML.
fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
