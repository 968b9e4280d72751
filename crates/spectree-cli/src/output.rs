//! Drains a root Spec's collected output, applies the `filter:` expression
//! (if any), and writes each surviving asset to a sink in the `format:`
//! wire encoding (spec.md Section 6).

use crate::error::Result;
use spectree_core::Asset;
use spectree_expr::{FilterSpec, FormatSpec};
use tokio::sync::mpsc::UnboundedReceiver;

/// Consumes `rx` to completion (the channel closes once the Spec tree's
/// `run` future resolves and every subspec has finished), writing each
/// asset `filter` keeps to `out` in `format`.
pub async fn drain_to(
    mut rx: UnboundedReceiver<Asset>,
    filter: &FilterSpec,
    format: &FormatSpec,
    out: &mut impl std::io::Write,
) -> Result<usize> {
    let mut written = 0;
    while let Some(mut asset) = rx.recv().await {
        if !filter.keeps(&asset) {
            continue;
        }
        spectree_wire::write_line(out, &mut asset, format)?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectree_core::{AssetUrl, TypeMask};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn drains_and_filters_assets() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut a = Asset::new_single(AssetUrl::new("leaf", "a.txt"), "leaf", TypeMask::single_read_write());
        a.set_bytes(b"hi".to_vec()).unwrap();
        a = a.with_mime("text/plain");
        let mut b = Asset::new_single(AssetUrl::new("leaf", "b.css"), "leaf", TypeMask::single_read_write());
        b.set_bytes(b"body{}".to_vec()).unwrap();
        b = b.with_mime("text/css");
        tx.send(a).unwrap();
        tx.send(b).unwrap();
        drop(tx);

        let filter = spectree_expr::parse_filter("filter: ext=txt").unwrap();
        let format = FormatSpec::default();
        let mut out = Vec::new();
        let written = drain_to(rx, &filter, &format, &mut out).await.unwrap();
        assert_eq!(written, 1);
        assert!(String::from_utf8(out).unwrap().contains("a.txt"));
    }
}
