//! Busca e ordenação do cadastro
//!
//! As regras vivem aqui para que o arquivo JSON e o SQLite devolvam
//! exatamente a mesma listagem.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::Patient;

/// Chave de comparação: sem acentos e em minúsculas
pub fn fold(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Mínimo de dígitos para o termo também casar com identificadores mascarados
const MIN_IDENTIFIER_DIGITS: usize = 3;

fn digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Termo de busca já normalizado
#[derive(Debug, Clone)]
pub struct SearchTerm {
    folded: String,
    digits: String,
}

impl SearchTerm {
    /// Retorna `None` para termos em branco, que equivalem a listar tudo
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            folded: fold(trimmed),
            digits: digits(trimmed),
        })
    }

    /// Nome, CNS, CPF ou ficha familiar contendo o termo
    pub fn matches(&self, patient: &Patient) -> bool {
        let fields = &patient.fields;
        if fold(&fields.name).contains(&self.folded) {
            return true;
        }

        [
            fields.cns.as_deref(),
            fields.cpf.as_deref(),
            fields.address.family_record.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|identifier| {
            fold(identifier).contains(&self.folded)
                || (self.digits.len() >= MIN_IDENTIFIER_DIGITS
                    && digits(identifier).contains(&self.digits))
        })
    }
}

/// Filtra pelo termo e aplica a ordem canônica
pub fn filter_and_sort(patients: Vec<Patient>, term: &str) -> Vec<Patient> {
    let mut patients = match SearchTerm::parse(term) {
        Some(term) => patients.into_iter().filter(|p| term.matches(p)).collect(),
        None => patients,
    };
    sort_patients(&mut patients);
    patients
}

/// Microáreas numéricas vêm antes das textuais; sem microárea fica por último
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum MicroAreaKey<'a> {
    Numeric(u32, &'a str),
    Text(String, &'a str),
    Missing,
}

fn micro_area_key(raw: Option<&str>) -> MicroAreaKey<'_> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => MicroAreaKey::Missing,
        Some(area) => match area.parse::<u32>() {
            Ok(n) => MicroAreaKey::Numeric(n, area),
            Err(_) => MicroAreaKey::Text(fold(area), area),
        },
    }
}

fn compare_micro_area(a: Option<&str>, b: Option<&str>) -> Ordering {
    micro_area_key(a).cmp(&micro_area_key(b))
}

/// Ordem canônica: microárea e depois nome, ignorando caixa e acentos
pub fn compare_patients(a: &Patient, b: &Patient) -> Ordering {
    compare_micro_area(a.micro_area(), b.micro_area())
        .then_with(|| fold(a.name()).cmp(&fold(b.name())))
        .then_with(|| a.name().cmp(b.name()))
        .then_with(|| a.created_at.cmp(&b.created_at))
}

pub fn sort_patients(patients: &mut [Patient]) {
    patients.sort_by(compare_patients);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, PatientFields};

    fn patient(name: &str, micro_area: Option<&str>) -> Patient {
        Patient::new(PatientFields {
            name: name.to_string(),
            address: Address {
                street: "Rua Principal".to_string(),
                micro_area: micro_area.map(str::to_string),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    fn names(patients: &[Patient]) -> Vec<&str> {
        patients.iter().map(Patient::name).collect()
    }

    #[test]
    fn fold_strips_accents_and_case() {
        assert_eq!(fold("ÁLVARO Conceição"), "alvaro conceicao");
    }

    #[test]
    fn sorts_by_micro_area_then_name() {
        let mut list = vec![
            patient("bruno", Some("02")),
            patient("Zilda", Some("01")),
            patient("Álvaro", Some("02")),
            patient("ana", Some("01")),
        ];
        sort_patients(&mut list);
        assert_eq!(names(&list), vec!["ana", "Zilda", "Álvaro", "bruno"]);
    }

    #[test]
    fn numeric_micro_areas_compare_as_numbers() {
        let mut list = vec![
            patient("A", Some("10")),
            patient("B", Some("2")),
            patient("C", None),
            patient("D", Some("")),
        ];
        sort_patients(&mut list);
        assert_eq!(names(&list), vec!["B", "A", "C", "D"]);
    }

    #[test]
    fn mixed_micro_areas_sort_the_same_from_any_start() {
        let areas = ["9", "10", "1A"];
        let starts = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in starts {
            let mut list: Vec<Patient> = order
                .iter()
                .map(|&i| patient(areas[i], Some(areas[i])))
                .collect();
            sort_patients(&mut list);
            assert_eq!(names(&list), vec!["9", "10", "1A"], "partindo de {order:?}");
        }
    }

    #[test]
    fn name_search_ignores_case_and_accents() {
        let term = SearchTerm::parse("JOSE").unwrap();
        assert!(term.matches(&patient("José da Silva", None)));
        assert!(!term.matches(&patient("Maria", None)));
    }

    #[test]
    fn identifier_search_uses_digits() {
        let mut p = patient("Carla", None);
        p.fields.cpf = Some("123.456.789-00".to_string());
        p.fields.cns = Some("898 0012 3456 7890".to_string());

        assert!(SearchTerm::parse("12345678900").unwrap().matches(&p));
        assert!(SearchTerm::parse("0012 3456").unwrap().matches(&p));
        assert!(!SearchTerm::parse("999").unwrap().matches(&p));
    }

    #[test]
    fn short_numbers_do_not_match_identifiers() {
        let mut p = patient("Ana", None);
        p.fields.cns = Some("700 2222 3456 7890".to_string());

        assert!(!SearchTerm::parse("Maria 2").unwrap().matches(&p));
        assert!(!SearchTerm::parse("22").unwrap().matches(&p));
        assert!(SearchTerm::parse("222").unwrap().matches(&p));
    }

    #[test]
    fn blank_term_keeps_everyone() {
        assert!(SearchTerm::parse("   ").is_none());
        let list = filter_and_sort(vec![patient("b", None), patient("a", None)], " ");
        assert_eq!(names(&list), vec!["a", "b"]);
    }
}
