//! Derived-field computation over field names.
//!
//! Both functions here are pure: the result depends on the field-name string
//! alone, so enrichment is reproducible across processes and re-running it
//! over an already-enriched table changes nothing.

use crate::data::{Enrichment, Record, Table};

/// Label assigned when no prefix rule matches.
pub const UNCLASSIFIED_COMPONENT: &str = "Outros/Sem Padrão";

/// Prefixes that mark a field name as standardized.
const STANDARD_PREFIXES: &[&str] = &[
    "TXT", "CBO", "RAD", "CHK", "CPF_", "CNP_", "CEP_", "TEL_", "EMA_",
];

/// Ordered component-type rules; first match wins.
///
/// The bare three-character rules come first, then the underscore-suffixed
/// document rules, then the remaining legacy underscore prefixes. Keep this
/// ordering: `TEL_CONTATO` must resolve through `TEL_`, not through a
/// shorter rule.
const COMPONENT_RULES: &[(&str, &str)] = &[
    ("LBL", "Label"),
    ("TXT", "TextBox"),
    ("TXA", "Textarea"),
    ("CHK", "CheckBox"),
    ("RAD", "RadioButton"),
    ("CBO", "Combobox"),
    ("IMG", "Imagem"),
    ("DT_", "Data"),
    ("LNK", "Hiperlink"),
    ("ARQ", "Arquivo"),
    ("MAP", "Mapa"),
    ("ENT", "Entidade"),
    ("FT_", "Foto"),
    ("PLT", "Planta"),
    ("BTN", "Button"),
    ("GRD", "Grid"),
    ("CSM", "Consumo"),
    ("AGD", "Agendamento"),
    ("FLX", "Fluxo"),
    ("CPF_", "CPF"),
    ("CNP_", "CNPJ"),
    ("CEP_", "CEP"),
    ("TEL_", "Telefone"),
    ("EMA_", "Email"),
    ("TAB_", "Tabela"),
    ("ICO_", "Ícone"),
    ("DAT_", "Data"),
    ("NUM_", "Número"),
    ("EML_", "Email"),
    ("URL_", "URL"),
];

/// Whether a field name follows an approved naming prefix.
///
/// Null or empty names are never standardized.
pub fn is_standardized(field_name: Option<&str>) -> bool {
    let Some(name) = field_name else {
        return false;
    };
    STANDARD_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// UI widget category inferred from the field-name prefix.
///
/// Evaluates [`COMPONENT_RULES`] in order; unmatched or null names map to
/// [`UNCLASSIFIED_COMPONENT`].
pub fn component_type(field_name: Option<&str>) -> &'static str {
    let Some(name) = field_name else {
        return UNCLASSIFIED_COMPONENT;
    };
    COMPONENT_RULES
        .iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, label)| *label)
        .unwrap_or(UNCLASSIFIED_COMPONENT)
}

/// Populate the derived attributes for every row.
///
/// The input table is never mutated; the result carries a fresh row vector
/// with `enriched` set on each record. Idempotent.
pub fn enrich(table: &Table) -> Table {
    if table.is_empty() {
        return table.clone();
    }
    let rows: Vec<Record> = table
        .rows()
        .iter()
        .map(|record| {
            let name = record.field_name.as_deref();
            let mut enriched = record.clone();
            enriched.enriched = Some(Enrichment {
                is_standardized: is_standardized(name),
                component_type: component_type(name).to_string(),
            });
            enriched
        })
        .collect();
    table.with_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnSet;

    fn field_record(name: Option<&str>) -> Record {
        Record {
            flow_id: None,
            service_id: None,
            form_id: None,
            step_id: None,
            field_name: name.map(|n| n.to_string()),
            child_field_name: None,
            child_caption: None,
            created_at: None,
            flow_status: None,
            author: None,
            enriched: None,
        }
    }

    #[test]
    fn standardized_prefixes_match_and_others_do_not() {
        assert!(is_standardized(Some("TXT_NOME")));
        assert!(is_standardized(Some("CBOTIPO")));
        assert!(is_standardized(Some("RAD_OPCAO")));
        assert!(is_standardized(Some("CHK_ACEITE")));
        assert!(is_standardized(Some("CPF_NUM")));
        assert!(is_standardized(Some("TEL_CONTATO")));
        assert!(!is_standardized(Some("ZZZ_CUSTOM")));
        assert!(!is_standardized(Some("BTN_ENVIAR")));
        assert!(!is_standardized(Some("")));
        assert!(!is_standardized(None));
    }

    #[test]
    fn component_rules_resolve_first_match_in_order() {
        assert_eq!(component_type(Some("TXT_NOME")), "TextBox");
        assert_eq!(component_type(Some("TXA_OBS")), "Textarea");
        assert_eq!(component_type(Some("TEL_CONTATO")), "Telefone");
        assert_eq!(component_type(Some("CPF_NUM")), "CPF");
        assert_eq!(component_type(Some("DT_ABERTURA")), "Data");
        assert_eq!(component_type(Some("DAT_FECHAMENTO")), "Data");
        assert_eq!(component_type(Some("URL_SITE")), "URL");
        assert_eq!(component_type(Some("ZZZ_CUSTOM")), UNCLASSIFIED_COMPONENT);
        assert_eq!(component_type(None), UNCLASSIFIED_COMPONENT);
    }

    #[test]
    fn underscore_rules_are_not_shadowed_by_shorter_ones() {
        // EML_ and EMA_ are distinct rules with distinct intent.
        assert_eq!(component_type(Some("EML_CONTATO")), "Email");
        assert_eq!(component_type(Some("EMA_CONTATO")), "Email");
        // No three-letter TEL rule exists, so TEL_ resolves to Telefone.
        assert_eq!(component_type(Some("TEL_FIXO")), "Telefone");
        // TXT_ still resolves through the three-letter TXT rule.
        assert_eq!(component_type(Some("TXT_LIVRE")), "TextBox");
    }

    #[test]
    fn enrich_is_idempotent_and_leaves_input_untouched() {
        let table = Table::new(
            vec![
                field_record(Some("TXT_NOME")),
                field_record(Some("ZZZ_CUSTOM")),
                field_record(None),
            ],
            ColumnSet::full(),
        );
        let once = enrich(&table);
        let twice = enrich(&once);
        assert_eq!(once, twice);
        assert!(table.rows().iter().all(|r| r.enriched.is_none()));

        let derived: Vec<bool> = once
            .rows()
            .iter()
            .map(|r| r.enriched.as_ref().unwrap().is_standardized)
            .collect();
        assert_eq!(derived, vec![true, false, false]);
    }

    #[test]
    fn enrich_on_empty_table_is_a_noop() {
        let empty = Table::empty();
        assert_eq!(enrich(&empty), empty);
    }
}
