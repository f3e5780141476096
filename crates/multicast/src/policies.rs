// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `multicast policies` command implementation.
//!
//! Prints how the proxy combines delegate answers for every callback it
//! forwards. Selectors outside this table are broadcast.

use multicast_core::{policy_table, CallbackDescriptor, MulticastError};

/// Run the `multicast policies` command.
///
/// If `--json` is passed, outputs the table as structured JSON for scripting.
pub fn run_policies(json: bool) -> Result<(), MulticastError> {
    let table = policy_table();
    if json {
        let rendered = serde_json::to_string_pretty(&table)
            .map_err(|e| MulticastError::Internal(format!("failed to serialize table: {e}")))?;
        println!("{rendered}");
    } else {
        print!("{}", render_table(&table));
    }
    Ok(())
}

/// Render descriptors as an aligned three-column text table.
fn render_table(table: &[CallbackDescriptor]) -> String {
    let rows: Vec<[String; 3]> = table
        .iter()
        .map(|d| {
            [
                d.callback.to_string(),
                d.policy.to_string(),
                d.selector.to_string(),
            ]
        })
        .collect();

    let header = ["CALLBACK", "POLICY", "SELECTOR"];
    let width = |col: usize| {
        rows.iter()
            .map(|r| r[col].len())
            .chain(std::iter::once(header[col].len()))
            .max()
            .unwrap_or(0)
    };
    let (w0, w1) = (width(0), width(1));

    let mut out = format!("{:<w0$}  {:<w1$}  {}\n", header[0], header[1], header[2]);
    for [callback, policy, selector] in &rows {
        out.push_str(&format!("{callback:<w0$}  {policy:<w1$}  {selector}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_every_callback_once() {
        let table = policy_table();
        let rendered = render_table(&table);
        assert_eq!(rendered.lines().count(), table.len() + 1);
        assert!(rendered.starts_with("CALLBACK"));
    }

    #[test]
    fn table_rows_show_policy_and_selector() {
        let rendered = render_table(&policy_table());
        let open_url = rendered
            .lines()
            .find(|l| l.starts_with("open_url "))
            .expect("open_url row");
        assert!(open_url.contains("boolean-or (default false)"));
        assert!(open_url.ends_with("application:openURL:options:"));
    }

    #[test]
    fn json_shape_is_stable() {
        let value = serde_json::to_value(policy_table()).unwrap();
        let first = &value[0];
        assert_eq!(first["callback"], "finish_launching");
        assert_eq!(
            first["selector"],
            "application:didFinishLaunchingWithOptions:"
        );
        assert_eq!(first["policy"]["boolean-or"]["default"], false);
    }
}
