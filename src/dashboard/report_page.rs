//! HTML rendering of the business financial report.

use maud::{Markup, html};
use time::{Date, macros::format_description};

use crate::{
    html::{
        PAGE_CONTAINER_STYLE, TABLE_CELL_AMOUNT_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, TABLE_STYLE, TABLE_TOTAL_ROW_STYLE, base, format_currency,
        format_percentage,
    },
    report::{CategoryBreakdown, DateRange, FinancialReport, MonthlyBreakdown},
    transaction::{Amount, Transaction},
};

const SECTION_HEADING_STYLE: &str = "text-xl font-semibold mt-8 mb-4";
const TABLE_CONTAINER_STYLE: &str = "relative overflow-x-auto shadow-md sm:rounded-lg mb-4";
const POSITIVE_STYLE: &str = "text-green-600 dark:text-green-400";
const NEGATIVE_STYLE: &str = "text-red-600 dark:text-red-400";

fn amount_color_class(amount: Amount) -> &'static str {
    if amount.is_negative() {
        NEGATIVE_STYLE
    } else {
        POSITIVE_STYLE
    }
}

/// Render the full report page.
pub(super) fn financial_report_view(report: &FinancialReport) -> Markup {
    let reporting_year = report
        .range
        .reporting_year()
        .unwrap_or(report.prepared_on.year());
    let net = report.summary.net_balance;

    let content = html! {
        div class=(PAGE_CONTAINER_STYLE)
        {
            header
            {
                h1 class="text-2xl font-bold mb-2" { "Business Financial Report" }
                p { "Period Covered: " (format_period(&report.range)) }
                p { "Prepared For: " (report.business_name) }
                p { "Prepared On: " (format_long_date(report.prepared_on)) }
            }

            section id="cash-flow"
            {
                h2 class=(SECTION_HEADING_STYLE) { "Cash Flow Statement" }

                (transactions_table(
                    "cash-inflows",
                    "Cash Inflows",
                    &report.income,
                    "Total Inflows",
                    report.summary.total_income,
                ))

                (transactions_table(
                    "cash-outflows",
                    "Cash Outflows",
                    &report.expenditures,
                    "Total Outflows",
                    report.summary.total_expenditure,
                ))

                p id="net-cash-flow" class={"text-lg font-semibold " (amount_color_class(net))}
                {
                    "Net Cash Flow: " (format_currency(net))
                }
            }

            section
            {
                h2 class=(SECTION_HEADING_STYLE)
                {
                    "Monthly Cash Flow Details (" (reporting_year) ")"
                }

                (monthly_table(&report.monthly))
            }

            section
            {
                h2 class=(SECTION_HEADING_STYLE) { "Category Breakdown" }

                (category_table(&report.categories))
            }
        }
    };

    base("Financial Report", &content)
}

fn transactions_table(
    id: &str,
    heading: &str,
    transactions: &[Transaction],
    total_label: &str,
    total: Amount,
) -> Markup {
    html! {
        div class=(TABLE_CONTAINER_STYLE)
        {
            table id=(id) class=(TABLE_STYLE)
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { (heading) }
                        th scope="col" class=(TABLE_CELL_AMOUNT_STYLE) { "Amount (GHS)" }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (row_label(transaction)) }
                            td class=(TABLE_CELL_AMOUNT_STYLE) { (format_currency(transaction.amount)) }
                        }
                    }

                    tr class=(TABLE_TOTAL_ROW_STYLE)
                    {
                        th scope="row" class=(TABLE_CELL_STYLE) { (total_label) }
                        td class=(TABLE_CELL_AMOUNT_STYLE) { (format_currency(total)) }
                    }
                }
            }
        }
    }
}

/// Rows show the description, falling back to the category for blank descriptions.
fn row_label(transaction: &Transaction) -> &str {
    match (transaction.description.trim(), transaction.category.as_deref()) {
        ("", Some(category)) => category,
        (description, _) => description,
    }
}

fn monthly_table(monthly: &[MonthlyBreakdown]) -> Markup {
    html! {
        div class=(TABLE_CONTAINER_STYLE)
        {
            table id="monthly-breakdown" class=(TABLE_STYLE)
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Month" }
                        th scope="col" class=(TABLE_CELL_AMOUNT_STYLE) { "Income" }
                        th scope="col" class=(TABLE_CELL_AMOUNT_STYLE) { "Expenditure" }
                        th scope="col" class=(TABLE_CELL_AMOUNT_STYLE) { "Net" }
                    }
                }

                tbody
                {
                    @for month in monthly {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class=(TABLE_CELL_STYLE) { (month.month) }
                            td class=(TABLE_CELL_AMOUNT_STYLE) { (format_currency(month.income)) }
                            td class=(TABLE_CELL_AMOUNT_STYLE) { (format_currency(month.expenditure)) }
                            td class={(TABLE_CELL_AMOUNT_STYLE) " " (amount_color_class(month.net))}
                            {
                                (format_currency(month.net))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn category_table(categories: &[CategoryBreakdown]) -> Markup {
    html! {
        div class=(TABLE_CONTAINER_STYLE)
        {
            table id="category-breakdown" class=(TABLE_STYLE)
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_AMOUNT_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_AMOUNT_STYLE) { "Percentage" }
                    }
                }

                tbody
                {
                    @for category in categories {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class=(TABLE_CELL_STYLE) { (category.category) }
                            td class=(TABLE_CELL_AMOUNT_STYLE) { (format_currency(category.amount)) }
                            td class=(TABLE_CELL_AMOUNT_STYLE) { (format_percentage(category.percentage)) }
                        }
                    }

                    @if categories.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="3" class={(TABLE_CELL_STYLE) " text-center"}
                            {
                                "No expenditures in this period."
                            }
                        }
                    }
                }
            }
        }
    }
}

fn format_period(range: &DateRange) -> String {
    match (range.start, range.end) {
        (Some(start), Some(end)) => format!("{start} – {end}"),
        (Some(start), None) => format!("From {start}"),
        (None, Some(end)) => format!("Up to {end}"),
        (None, None) => "All dates".to_owned(),
    }
}

/// Format a date like "18 October 2026".
fn format_long_date(date: Date) -> String {
    date.format(format_description!(
        "[day padding:none] [month repr:long] [year]"
    ))
    .unwrap_or_else(|error| {
        tracing::warn!("could not format {date}: {error}");
        date.to_string()
    })
}

#[cfg(test)]
mod tests {
    use scraper::{ElementRef, Html, Selector};
    use time::macros::date;

    use crate::{
        dashboard::report_page::{financial_report_view, format_long_date, format_period},
        report::{
            DateRange, FinancialReport,
            test_utils::{expenditure, income, scenario_transactions},
        },
    };

    fn render(report: &FinancialReport) -> Html {
        let html = Html::parse_document(&financial_report_view(report).into_string());
        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );

        html
    }

    fn rows(html: &Html, table_id: &str) -> Vec<Vec<String>> {
        let row_selector = Selector::parse(&format!("#{table_id} tbody tr")).unwrap();
        let cell_selector = Selector::parse("th, td").unwrap();

        html.select(&row_selector)
            .map(|row| {
                row.select(&cell_selector)
                    .map(|cell: ElementRef| cell.text().collect::<String>().trim().to_owned())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn renders_cash_flow_tables_with_totals() {
        let range = DateRange::new(Some(date!(2024 - 01 - 01)), Some(date!(2024 - 02 - 28))).unwrap();
        let report = FinancialReport::build(
            "Acme Bakery",
            range,
            date!(2024 - 03 - 01),
            &scenario_transactions(),
        );

        let html = render(&report);

        assert_eq!(
            rows(&html, "cash-inflows"),
            vec![
                vec!["transaction #1", "₵100.00"],
                vec!["transaction #4", "₵20.00"],
                vec!["Total Inflows", "₵120.00"],
            ]
        );
        assert_eq!(
            rows(&html, "cash-outflows"),
            vec![
                vec!["transaction #2", "₵40.00"],
                vec!["transaction #3", "₵10.00"],
                vec!["Total Outflows", "₵50.00"],
            ]
        );

        let net = Selector::parse("#net-cash-flow").unwrap();
        let net = html.select(&net).next().unwrap();
        assert_eq!(net.text().collect::<String>().trim(), "Net Cash Flow: ₵70.00");
        assert!(net.value().attr("class").unwrap().contains("text-green-600"));
    }

    #[test]
    fn renders_monthly_and_category_breakdowns() {
        let range = DateRange::new(Some(date!(2024 - 01 - 01)), None).unwrap();
        let report = FinancialReport::build(
            "Acme Bakery",
            range,
            date!(2024 - 03 - 01),
            &scenario_transactions(),
        );

        let html = render(&report);

        let monthly = rows(&html, "monthly-breakdown");
        assert_eq!(monthly.len(), 12);
        assert_eq!(monthly[0], vec!["Jan 2024", "₵100.00", "₵40.00", "₵60.00"]);
        assert_eq!(monthly[1], vec!["Feb 2024", "₵20.00", "₵10.00", "₵10.00"]);
        assert_eq!(monthly[11], vec!["Dec 2024", "₵0.00", "₵0.00", "₵0.00"]);
        assert_eq!(
            rows(&html, "category-breakdown"),
            vec![vec!["Rent", "₵50.00", "100.0%"]]
        );
    }

    #[test]
    fn negative_net_cash_flow_is_red() {
        let transactions = vec![
            income(1, 500, date!(2024 - 05 - 01)),
            expenditure(2, 2000, date!(2024 - 05 - 02), "Flour"),
            expenditure(3, 500, date!(2024 - 05 - 03), "Power"),
        ];
        let report =
            FinancialReport::build("Acme Bakery", DateRange::ALL, date!(2024 - 06 - 01), &transactions);

        let html = render(&report);

        let net = Selector::parse("#net-cash-flow").unwrap();
        let net = html.select(&net).next().unwrap();
        assert_eq!(net.text().collect::<String>().trim(), "Net Cash Flow: -₵20.00");
        assert!(net.value().attr("class").unwrap().contains("text-red-600"));
        assert_eq!(
            rows(&html, "category-breakdown"),
            vec![
                vec!["Flour", "₵20.00", "80.0%"],
                vec!["Power", "₵5.00", "20.0%"],
            ]
        );
    }

    #[test]
    fn empty_report_says_there_are_no_expenditures() {
        let report = FinancialReport::build("Acme Bakery", DateRange::ALL, date!(2024 - 06 - 01), &[]);

        let html = render(&report);

        assert_eq!(
            rows(&html, "category-breakdown"),
            vec![vec!["No expenditures in this period."]]
        );
        assert_eq!(
            rows(&html, "cash-inflows"),
            vec![vec!["Total Inflows", "₵0.00"]]
        );
        assert_eq!(rows(&html, "monthly-breakdown")[0][0], "Jan 2024");
    }

    #[test]
    fn formats_dates_for_the_header() {
        assert_eq!(format_long_date(date!(2026 - 10 - 08)), "8 October 2026");
        assert_eq!(
            format_period(&DateRange::new(Some(date!(2024 - 01 - 01)), Some(date!(2024 - 01 - 31))).unwrap()),
            "2024-01-01 – 2024-01-31"
        );
        assert_eq!(format_period(&DateRange::ALL), "All dates");
    }
}
