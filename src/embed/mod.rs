// SPDX-License-Identifier: MIT
//! Embed script emitter.
//!
//! Renders the self-contained client script served to third-party websites:
//! a popup for the newest unseen feature plus a "What's New" changelog
//! widget, both reporting impressions back to the tracker endpoint.
//!
//! The script runs in a browser we do not control; this module's whole job is
//! safe template generation. All feature-derived text is HTML-escaped here,
//! before interpolation, and all dynamic values are embedded as JSON string
//! literals so attacker-controlled input can never break out of the template.

use serde_json::json;

use crate::storage::{FeatureRow, Plan};

pub const DEFAULT_COLOR: &str = "#3b82f6";

/// Browser-local marker recording the last feature id shown as a popup.
pub const LAST_SEEN_KEY: &str = "fb_last_seen";

/// Changelog entries show at most this many characters of the description.
const SUMMARY_CHARS: usize = 80;

// ─── Escaping and validation ─────────────────────────────────────────────────

/// HTML-entity escaping for text interpolated into generated markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// `#` followed by 3 or 6 hex digits.
pub fn is_valid_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    (digits.len() == 3 || digits.len() == 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Resolve the widget color. The free plan ignores customization entirely;
/// paid plans prefer the query override, then the saved setting. Invalid
/// values fall back to the default.
pub fn effective_color(plan: Plan, query: Option<&str>, saved: &str) -> String {
    if plan.is_free() {
        return DEFAULT_COLOR.to_string();
    }
    for candidate in [query, Some(saved)].into_iter().flatten() {
        if is_valid_hex_color(candidate) {
            return candidate.to_string();
        }
    }
    DEFAULT_COLOR.to_string()
}

// ─── Rendering ───────────────────────────────────────────────────────────────

pub struct EmbedParams<'a> {
    pub uid: &'a str,
    /// Effective widget color (already resolved via `effective_color`).
    pub color: &'a str,
    /// Absolute URL of the impression endpoint.
    pub track_url: &'a str,
    /// Newest first; at most the five most recent.
    pub features: &'a [FeatureRow],
    pub show_branding: bool,
}

/// Render the embeddable script. Pure string generation, no side effects.
pub fn render_script(params: &EmbedParams) -> String {
    let features: Vec<serde_json::Value> = params
        .features
        .iter()
        .map(|f| {
            json!({
                "id": f.id,
                "feature_type": escape_html(&f.feature_type),
                "title": escape_html(&f.title),
                "description": escape_html(&f.description),
                // Truncated before escaping so entities are never split.
                "summary": escape_html(&truncate_chars(&f.description, SUMMARY_CHARS)),
            })
        })
        .collect();

    // Tokens in template order. Each is substituted exactly once and the
    // substituted value is never re-scanned, so request- or feature-derived
    // text cannot smuggle a token into the template.
    fill(
        SCRIPT_TEMPLATE,
        &[
            ("__UID__", json!(params.uid).to_string()),
            ("__COLOR__", json!(params.color).to_string()),
            ("__TRACK_URL__", json!(params.track_url).to_string()),
            ("__FEATURES__", serde_json::Value::Array(features).to_string()),
            (
                "__BRANDING__",
                if params.show_branding { "true" } else { "false" }.to_string(),
            ),
            ("__LAST_SEEN_KEY__", json!(LAST_SEEN_KEY).to_string()),
        ],
    )
}

fn fill(template: &str, substitutions: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    for (token, value) in substitutions {
        if let Some((before, after)) = rest.split_once(token) {
            out.push_str(before);
            out.push_str(value);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// The emitted IIFE. Dynamic values arrive as JSON literals via token
/// replacement; the last-seen marker goes through an injectable {get,set}
/// store (window.__fbStore) so popup suppression is testable without an
/// ambient localStorage.
const SCRIPT_TEMPLATE: &str = r#"(function() {
  var UID = __UID__;
  var PRIMARY_COLOR = __COLOR__;
  var TRACK_URL = __TRACK_URL__;
  var FEATURES = __FEATURES__;
  var SHOW_BRANDING = __BRANDING__;
  var LAST_SEEN_KEY = __LAST_SEEN_KEY__;

  // Titles, descriptions, and types are HTML-escaped server side.

  var store = (window.__fbStore && typeof window.__fbStore.get === "function")
    ? window.__fbStore
    : {
        get: function(key) { try { return window.localStorage.getItem(key); } catch (e) { return null; } },
        set: function(key, value) { try { window.localStorage.setItem(key, value); } catch (e) {} }
      };

  function track(featureId, type) {
    fetch(TRACK_URL, {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ featureId: featureId, uid: UID, type: type })
    });
  }

  function createPopup(feature) {
    var popup = document.createElement("div");
    popup.id = "feature-blast-popup";
    popup.innerHTML =
      '<div style="position: fixed; top: 0; left: 0; right: 0; bottom: 0; background: rgba(0,0,0,0.7); z-index: 999999; display: flex; align-items: center; justify-content: center; animation: fbFadeIn 0.3s;">' +
        '<div style="background: white; border-radius: 16px; padding: 32px; max-width: 500px; box-shadow: 0 20px 60px rgba(0,0,0,0.3); animation: fbSlideUp 0.3s;">' +
          '<div style="display: flex; justify-content: space-between; align-items: start; margin-bottom: 16px;">' +
            '<span style="background: ' + PRIMARY_COLOR + '; color: white; padding: 4px 12px; border-radius: 20px; font-size: 12px; font-weight: 600;">' + feature.feature_type + '</span>' +
            '<button data-fb-close style="background: none; border: none; font-size: 24px; cursor: pointer; color: #666;">&times;</button>' +
          '</div>' +
          '<h2 style="color: #1a1a1a; font-size: 24px; font-weight: bold; margin: 16px 0;">' + feature.title + '</h2>' +
          '<p style="color: #666; line-height: 1.6;">' + feature.description + '</p>' +
          '<button data-fb-confirm style="background: ' + PRIMARY_COLOR + '; color: white; border: none; padding: 12px 24px; border-radius: 8px; font-weight: 600; cursor: pointer; margin-top: 20px; width: 100%;">Got it!</button>' +
        '</div>' +
      '</div>';
    popup.querySelector("[data-fb-close]").addEventListener("click", function() { popup.remove(); });
    popup.querySelector("[data-fb-confirm]").addEventListener("click", function() {
      track(feature.id, "click");
      popup.remove();
    });
    document.body.appendChild(popup);
    track(feature.id, "view");
  }

  function createChangelog() {
    var list = "";
    for (var i = 0; i < FEATURES.length; i++) {
      var f = FEATURES[i];
      list +=
        '<div data-fb-entry="' + f.id + '" style="padding: 12px; border-bottom: 1px solid #eee; cursor: pointer;">' +
          '<div style="font-size: 12px; color: ' + PRIMARY_COLOR + '; font-weight: 600; margin-bottom: 4px;">' + f.feature_type + '</div>' +
          '<div style="font-weight: 600; color: #1a1a1a; margin-bottom: 4px;">' + f.title + '</div>' +
          '<div style="font-size: 14px; color: #666;">' + f.summary + '...</div>' +
        '</div>';
    }
    var branding = SHOW_BRANDING
      ? '<div style="padding: 8px 16px; font-size: 11px; color: #999; text-align: center;">Powered by FeatureBlast</div>'
      : '';
    var changelog = document.createElement("div");
    changelog.id = "feature-blast-changelog";
    changelog.innerHTML =
      '<div style="position: fixed; bottom: 20px; right: 20px; background: white; border-radius: 12px; box-shadow: 0 10px 40px rgba(0,0,0,0.1); width: 320px; max-height: 400px; overflow: hidden; z-index: 999998;">' +
        '<div style="background: ' + PRIMARY_COLOR + '; color: white; padding: 16px; font-weight: 600;">✨ What\'s New</div>' +
        '<div style="padding: 16px; max-height: 300px; overflow-y: auto;">' + list + '</div>' +
        branding +
      '</div>';
    changelog.addEventListener("click", function(event) {
      var entry = event.target.closest("[data-fb-entry]");
      if (entry) { track(entry.getAttribute("data-fb-entry"), "click"); }
    });
    document.body.appendChild(changelog);
  }

  if (FEATURES.length > 0) {
    var latest = FEATURES[0];
    if (store.get(LAST_SEEN_KEY) !== latest.id) {
      setTimeout(function() {
        createPopup(latest);
        store.set(LAST_SEEN_KEY, latest.id);
      }, 2000);
    }
    createChangelog();
  }

  var style = document.createElement("style");
  style.textContent = "@keyframes fbFadeIn { from { opacity: 0; } to { opacity: 1; } } @keyframes fbSlideUp { from { transform: translateY(20px); opacity: 0; } to { transform: translateY(0); opacity: 1; } }";
  document.head.appendChild(style);
})();
"#;
