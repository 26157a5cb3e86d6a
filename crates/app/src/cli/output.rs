//! Table and money formatting for command output.

use std::ops::Range;

use driveshare::pricing::CURRENCY;
use rusty_money::Money;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};

/// Format minor units in the marketplace currency, e.g. `$1,200.00`.
pub(crate) fn money(minor: u64) -> String {
    i64::try_from(minor).map_or_else(
        |_overflow| format!("{minor} minor units"),
        |minor| Money::from_minor(minor, CURRENCY).to_string(),
    )
}

/// Render rows under a bold header, right-aligning the columns in `amounts`.
pub(crate) fn table<const N: usize>(
    header: [&str; N],
    rows: impl IntoIterator<Item = [String; N]>,
    amounts: Range<usize>,
) -> String {
    let mut builder = Builder::default();

    builder.push_record(header);

    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(amounts), Alignment::right());

    table.to_string()
}

/// Print `name: value` pairs, one per line.
pub(crate) fn fields<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) {
    for (name, value) in pairs {
        println!("{name}: {value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_uses_major_units() {
        assert_eq!(money(86_000), "$860.00");
        assert_eq!(money(0), "$0.00");
    }

    #[test]
    fn table_lists_header_and_rows() {
        let rendered = table(
            ["Car", "Rate"],
            [["Tesla Model 3".to_string(), money(12_000)]],
            1..2,
        );

        assert!(rendered.contains("Car"));
        assert!(rendered.contains("Tesla Model 3"));
        assert!(rendered.contains("$120.00"));
    }
}
