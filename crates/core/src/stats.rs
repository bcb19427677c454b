use serde::Serialize;

use crate::currency::{format_usd, parse_currency};
use crate::row::Row;
use crate::sheet::SheetState;

/// Footer figures for the rows currently shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FooterStats {
    pub total_items: usize,
    /// `None` when there is no visible Price column.
    pub price: Option<PriceStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStats {
    pub total: f64,
    pub average: f64,
    pub priced_rows: usize,
}

impl PriceStats {
    pub fn total_display(&self) -> String {
        format!("Total: {}", format_usd(self.total))
    }

    pub fn average_display(&self) -> String {
        format!("Avg: {}", format_usd(self.average))
    }
}

/// Count `rows` and sum their prices. Read-only views and hidden Price
/// columns show the count only.
pub fn footer_stats(state: &SheetState, rows: &[&Row], hidden_columns: &[String]) -> FooterStats {
    let price_column = state.columns.iter().find(|c| c.is_price_column());
    let price = match price_column {
        Some(column) if !state.read_only && !hidden_columns.contains(&column.id) => {
            let prices: Vec<f64> = rows.iter().filter_map(|r| parse_currency(r.cell(&column.id))).collect();
            let total: f64 = prices.iter().sum();
            let average = if prices.is_empty() { 0.0 } else { total / prices.len() as f64 };
            Some(PriceStats { total, average, priced_rows: prices.len() })
        },
        _ => None,
    };
    FooterStats { total_items: rows.len(), price }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::inventory_columns;
    use crate::constants::labels;

    fn priced_sheet(prices: &[&str]) -> SheetState {
        let mut state = SheetState::blank_with_columns(&inventory_columns());
        let price_id = state.column_by_label(labels::PRICE).unwrap().id.clone();
        state.rows = prices
            .iter()
            .map(|p| {
                let mut row = Row::blank();
                row.set_cell(&price_id, *p);
                row
            })
            .collect();
        state
    }

    #[test]
    fn test_totals_skip_unpriced_rows() {
        let state = priced_sheet(&["20", "$10.50", "", "n/a"]);
        let rows: Vec<&Row> = state.rows.iter().collect();
        let stats = footer_stats(&state, &rows, &[]);
        assert_eq!(stats.total_items, 4);
        let price = stats.price.unwrap();
        assert_eq!(price.priced_rows, 2);
        assert_eq!(price.total_display(), "Total: $30.50");
        assert_eq!(price.average_display(), "Avg: $15.25");
    }

    #[test]
    fn test_hidden_price_shows_count_only() {
        let state = priced_sheet(&["20"]);
        let price_id = state.column_by_label(labels::PRICE).unwrap().id.clone();
        let rows: Vec<&Row> = state.rows.iter().collect();
        assert!(footer_stats(&state, &rows, &[price_id]).price.is_none());

        let mut read_only = state.clone();
        read_only.read_only = true;
        assert!(footer_stats(&read_only, &rows, &[]).price.is_none());
    }
}
