//! Decodificação e validação do formulário de paciente
//!
//! Os nomes dos campos seguem os `name` usados nas páginas HTML. Caixas de
//! seleção só contam como marcadas quando aparecem no corpo da requisição;
//! campos de texto em branco viram `None`.

use chrono::NaiveDate;
use registro_db::{Address, HealthMarkers, Patient, PatientFields, SocialProfile};
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Caixas de seleção do formulário: nome do campo e rótulo
pub const CHECKBOXES: &[(&str, &str)] = &[
    ("bolsaFamilia", "Bolsa Família"),
    ("bpc", "BPC"),
    ("hipertenso", "Hipertenso"),
    ("diabetico", "Diabético"),
    ("gestante", "Gestante"),
    ("acamado", "Acamado"),
    ("fumante", "Fumante"),
    ("domiciliado", "Domiciliado"),
    ("deficiencia", "Pessoa com deficiência"),
    ("saudeMental", "Saúde mental"),
];

fn validate_birth_date(value: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| {
            let mut err = ValidationError::new("birth_date");
            err.message = Some("Data de nascimento inválida (use AAAA-MM-DD)".into());
            err
        })
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PatientForm {
    #[serde(rename = "nome")]
    #[validate(required(message = "Informe o nome do paciente"))]
    pub name: Option<String>,
    pub cns: Option<String>,
    pub cpf: Option<String>,
    #[serde(rename = "dataNascimento")]
    #[validate(custom = "validate_birth_date")]
    pub birth_date: Option<String>,
    #[serde(rename = "nomeMae")]
    pub mother_name: Option<String>,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,

    #[serde(rename = "endereco")]
    #[validate(required(message = "Informe o endereço"))]
    pub street: Option<String>,
    #[serde(rename = "numero")]
    pub number: Option<String>,
    #[serde(rename = "bairro")]
    pub neighborhood: Option<String>,
    #[serde(rename = "cep")]
    pub postal_code: Option<String>,
    #[serde(rename = "microarea")]
    pub micro_area: Option<String>,
    #[serde(rename = "familiaId")]
    pub family_record: Option<String>,

    #[serde(rename = "escolaridade")]
    pub education: Option<String>,
    #[serde(rename = "ocupacao")]
    pub occupation: Option<String>,
    #[serde(rename = "situacaoTrabalho")]
    pub employment_status: Option<String>,
    #[serde(rename = "bolsaFamilia")]
    pub bolsa_familia: Option<String>,
    pub bpc: Option<String>,

    #[serde(rename = "hipertenso")]
    pub hypertensive: Option<String>,
    #[serde(rename = "diabetico")]
    pub diabetic: Option<String>,
    #[serde(rename = "gestante")]
    pub pregnant: Option<String>,
    #[serde(rename = "acamado")]
    pub bedridden: Option<String>,
    #[serde(rename = "fumante")]
    pub smoker: Option<String>,
    #[serde(rename = "domiciliado")]
    pub home_bound: Option<String>,
    #[serde(rename = "deficiencia")]
    pub disabled: Option<String>,
    #[serde(rename = "saudeMental")]
    pub mental_health: Option<String>,

    #[serde(rename = "observacoes")]
    pub notes: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn checkbox(on: bool) -> Option<String> {
    on.then(|| "on".to_string())
}

impl PatientForm {
    /// Preenche o formulário de edição a partir de uma ficha existente
    pub fn from_patient(patient: &Patient) -> Self {
        let f = patient.fields.clone();
        Self {
            name: Some(f.name),
            cns: f.cns,
            cpf: f.cpf,
            birth_date: f.birth_date.map(|d| d.format(DATE_FORMAT).to_string()),
            mother_name: f.mother_name,
            phone: f.phone,
            street: Some(f.address.street),
            number: f.address.number,
            neighborhood: f.address.neighborhood,
            postal_code: f.address.postal_code,
            micro_area: f.address.micro_area,
            family_record: f.address.family_record,
            education: f.social.education,
            occupation: f.social.occupation,
            employment_status: f.social.employment_status,
            bolsa_familia: checkbox(f.social.bolsa_familia),
            bpc: checkbox(f.social.bpc),
            hypertensive: checkbox(f.markers.hypertensive),
            diabetic: checkbox(f.markers.diabetic),
            pregnant: checkbox(f.markers.pregnant),
            bedridden: checkbox(f.markers.bedridden),
            smoker: checkbox(f.markers.smoker),
            home_bound: checkbox(f.markers.home_bound),
            disabled: checkbox(f.markers.disabled),
            mental_health: checkbox(f.markers.mental_health),
            notes: f.notes,
        }
    }

    /// Estado de uma caixa de seleção pelo nome do campo HTML
    pub fn is_checked(&self, field: &str) -> bool {
        let value = match field {
            "bolsaFamilia" => &self.bolsa_familia,
            "bpc" => &self.bpc,
            "hipertenso" => &self.hypertensive,
            "diabetico" => &self.diabetic,
            "gestante" => &self.pregnant,
            "acamado" => &self.bedridden,
            "fumante" => &self.smoker,
            "domiciliado" => &self.home_bound,
            "deficiencia" => &self.disabled,
            "saudeMental" => &self.mental_health,
            _ => return false,
        };
        value.is_some()
    }

    /// Apara os campos de texto; caixas de seleção ficam como vieram
    fn normalized(self) -> Self {
        Self {
            name: clean(self.name),
            cns: clean(self.cns),
            cpf: clean(self.cpf),
            birth_date: clean(self.birth_date),
            mother_name: clean(self.mother_name),
            phone: clean(self.phone),
            street: clean(self.street),
            number: clean(self.number),
            neighborhood: clean(self.neighborhood),
            postal_code: clean(self.postal_code),
            micro_area: clean(self.micro_area),
            family_record: clean(self.family_record),
            education: clean(self.education),
            occupation: clean(self.occupation),
            employment_status: clean(self.employment_status),
            notes: clean(self.notes),
            ..self
        }
    }

    /// Valida e converte para os campos aceitos pelo cadastro
    pub fn into_fields(self) -> Result<PatientFields, ValidationErrors> {
        let form = self.normalized();
        form.validate()?;

        let markers = HealthMarkers {
            hypertensive: form.hypertensive.is_some(),
            diabetic: form.diabetic.is_some(),
            pregnant: form.pregnant.is_some(),
            bedridden: form.bedridden.is_some(),
            smoker: form.smoker.is_some(),
            home_bound: form.home_bound.is_some(),
            disabled: form.disabled.is_some(),
            mental_health: form.mental_health.is_some(),
        };

        Ok(PatientFields {
            name: form.name.unwrap_or_default(),
            cns: form.cns,
            cpf: form.cpf,
            birth_date: form
                .birth_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok()),
            mother_name: form.mother_name,
            phone: form.phone,
            address: Address {
                street: form.street.unwrap_or_default(),
                number: form.number,
                neighborhood: form.neighborhood,
                postal_code: form.postal_code,
                micro_area: form.micro_area,
                family_record: form.family_record,
            },
            social: SocialProfile {
                education: form.education,
                occupation: form.occupation,
                employment_status: form.employment_status,
                bolsa_familia: form.bolsa_familia.is_some(),
                bpc: form.bpc.is_some(),
            },
            markers,
            notes: form.notes,
        })
    }
}

/// Campos validados, na ordem em que aparecem na página
const FIELD_ORDER: &[&str] = &["nome", "dataNascimento", "endereco"];

fn field_position(field: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|f| *f == field)
        .unwrap_or(FIELD_ORDER.len())
}

/// Mensagens legíveis, na ordem dos campos do formulário
pub fn error_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| field_position(a).cmp(&field_position(b)).then(a.cmp(b)));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Campo inválido: {field}"))
            })
        })
        .collect()
}
