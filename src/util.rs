//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values in a
/// single left-to-right pass; substituted text is never scanned again.
/// Unknown `{...}` sequences are kept as they are.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open + 1..];
    let hit = after.find('}').and_then(|close| {
      let key = &after[..close];
      pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| (close, *v))
    });
    match hit {
      Some((close, value)) => {
        out.push_str(value);
        rest = &after[close + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }
  out.push_str(rest);
  out
}

/// Cut `s` to at most `max` characters, appending "..." when something was dropped.
/// Counts chars, not bytes, so CJK text never splits mid-codepoint.
pub fn truncate_chars(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}...", head)
  }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge prompt/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  let total = s.len();
  if s.chars().count() <= max {
    s.to_string()
  } else {
    format!("{}… ({} bytes total)", s.chars().take(max).collect::<String>(), total)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_template_replaces_every_occurrence() {
    let out = fill_template("{a} and {a} with {b}; {missing}", &[("a", "x"), ("b", "y")]);
    assert_eq!(out, "x and x with y; {missing}");
  }

  #[test]
  fn substituted_values_are_not_rescanned() {
    let out = fill_template("code: {code}\nmsg: {msg}", &[("code", "f\"{msg}\""), ("msg", "hi")]);
    assert_eq!(out, "code: f\"{msg}\"\nmsg: hi");
    assert_eq!(fill_template("{{a}} {", &[("a", "x")]), "{x} {");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(truncate_chars("两数之和", 2), "两数...");
    assert_eq!(truncate_chars("short", 10), "short");
    assert!(trunc_for_log("反转链表反转链表", 3).starts_with("反转链…"));
  }
}
