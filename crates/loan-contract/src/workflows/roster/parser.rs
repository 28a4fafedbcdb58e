use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::{CustomerRecord, RosterContact};

const LIST_SEPARATOR: char = ';';
/// Spreadsheet exports write missing cells as this literal.
const MISSING_CELL: &str = "nan";

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<CustomerRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<RosterRow>() {
        let row = row?;
        if clean(&row.main_id_card).is_empty() {
            continue;
        }
        records.push(row.into_record());
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(default)]
    branch_short_name: String,
    #[serde(default)]
    main_name: String,
    #[serde(default)]
    main_id_card: String,
    #[serde(default)]
    main_mobile: String,
    #[serde(default)]
    main_address: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    spouse_name: Option<String>,
    #[serde(default)]
    spouse_id_card: String,
    #[serde(default)]
    spouse_mobile: String,
    #[serde(default)]
    guarantor_names: String,
    #[serde(default)]
    guarantor_id_cards: String,
    #[serde(default)]
    guarantor_mobiles: String,
}

impl RosterRow {
    fn into_record(self) -> CustomerRecord {
        let spouse = self.spouse_name.map(|name| RosterContact {
            name,
            id_card: clean(&self.spouse_id_card),
            mobile: clean(&self.spouse_mobile),
        });

        let names = split_list(&self.guarantor_names);
        let id_cards = split_list(&self.guarantor_id_cards);
        let mobiles = split_list(&self.guarantor_mobiles);
        let guarantors = names
            .into_iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(index, name)| RosterContact {
                name,
                id_card: id_cards.get(index).cloned().unwrap_or_default(),
                mobile: mobiles.get(index).cloned().unwrap_or_default(),
            })
            .collect();

        CustomerRecord {
            branch_short_name: clean(&self.branch_short_name),
            main: RosterContact {
                name: clean(&self.main_name),
                id_card: clean(&self.main_id_card),
                mobile: clean(&self.main_mobile),
            },
            main_address: clean(&self.main_address),
            spouse,
            guarantors,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case(MISSING_CELL)))
}

fn clean(value: &str) -> String {
    let value = value.trim();
    if value.eq_ignore_ascii_case(MISSING_CELL) {
        String::new()
    } else {
        value.to_string()
    }
}

/// Positional split; blank slots are kept so parallel columns stay aligned.
fn split_list(value: &str) -> Vec<String> {
    value.split(LIST_SEPARATOR).map(clean).collect()
}

#[cfg(test)]
pub(crate) fn split_list_for_tests(value: &str) -> Vec<String> {
    split_list(value)
}
