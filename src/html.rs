use std::sync::OnceLock;

use maud::{DOCTYPE, Markup, html};
use numfmt::{Formatter, Precision};

use crate::transaction::Amount;

/// The currency symbol shown in front of amounts.
pub const CURRENCY_SYMBOL: &str = "₵";

// Table styles
pub const TABLE_STYLE: &str = "w-full text-sm text-left text-gray-500 dark:text-gray-400";

pub const TABLE_HEADER_STYLE: &str = "text-xs text-gray-700 uppercase \
    bg-gray-50 dark:bg-gray-700 dark:text-gray-400";

pub const TABLE_ROW_STYLE: &str = "bg-white border-b dark:bg-gray-800 dark:border-gray-700";

pub const TABLE_TOTAL_ROW_STYLE: &str = "bg-gray-100 font-semibold text-gray-900 \
    dark:bg-gray-700 dark:text-white";

pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

pub const TABLE_CELL_AMOUNT_STYLE: &str = "px-6 py-4 text-right whitespace-nowrap";

// Page container
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col px-6 py-8 mx-auto max-w-screen-md lg:py-5 text-gray-900 dark:text-white";

/// Wrap `content` in a full HTML document titled "`title` - Ledgerline".
pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Ledgerline" }
                // The report is printed as well as viewed, so the grid lines are inlined.
                style
                {
                    r#"
                    body { font-family: sans-serif; }
                    table { border-collapse: collapse; width: 100%; }
                    th, td { border: 1px solid #d1d5db; padding: 0.4rem 0.75rem; }
                    .text-right { text-align: right; }
                    .text-green-600 { color: #16a34a; }
                    .text-red-600 { color: #dc2626; }
                    @media print {
                        section { break-inside: avoid; }
                    }
                    "#
                }
            }

            body class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)
            }
        }
    }
}

/// Format `amount` with the currency symbol, thousands separators and two
/// decimal places, e.g. "₵1,234.50" or "-₵10.00".
pub fn format_currency(amount: Amount) -> String {
    static WHOLE_UNITS_FMT: OnceLock<Formatter> = OnceLock::new();

    let whole_units_fmt = WHOLE_UNITS_FMT.get_or_init(|| {
        Formatter::currency(CURRENCY_SYMBOL)
            .unwrap_or_default()
            .precision(Precision::Decimals(0))
    });

    let (whole_units, cents) = amount.split_abs();
    let sign = if amount.is_negative() { "-" } else { "" };

    let whole_units = if whole_units == 0 {
        // numfmt renders zero as "0" without the prefix.
        format!("{CURRENCY_SYMBOL}0")
    } else {
        whole_units_fmt.fmt_string(whole_units as f64)
    };

    format!("{sign}{whole_units}.{cents:02}")
}

/// Format a percentage with one decimal place, e.g. "12.5%".
pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage:.1}%")
}
