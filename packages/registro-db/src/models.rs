//! Modelos de dados do cadastro de pacientes
//!
//! Este módulo define a ficha do paciente acompanhada pelo ACS e os campos
//! editáveis usados na criação e atualização.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Endereço do paciente dentro do território da equipe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Logradouro (obrigatório)
    pub street: String,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    /// CEP
    pub postal_code: Option<String>,
    /// Microárea atribuída ao agente
    pub micro_area: Option<String>,
    /// Número da ficha familiar
    pub family_record: Option<String>,
}

/// Dados sociodemográficos
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialProfile {
    /// Escolaridade
    pub education: Option<String>,
    /// Ocupação
    pub occupation: Option<String>,
    /// Situação no mercado de trabalho
    pub employment_status: Option<String>,
    /// Beneficiário do Bolsa Família
    #[serde(default)]
    pub bolsa_familia: bool,
    /// Beneficiário do Benefício de Prestação Continuada
    #[serde(default)]
    pub bpc: bool,
}

/// Condições de saúde (marcadores)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthMarkers {
    pub hypertensive: bool,
    pub diabetic: bool,
    pub pregnant: bool,
    pub bedridden: bool,
    pub smoker: bool,
    /// Domiciliado: acompanhado em casa, mas não acamado
    pub home_bound: bool,
    /// Pessoa com deficiência
    pub disabled: bool,
    pub mental_health: bool,
}

impl HealthMarkers {
    /// Rótulos dos marcadores ativos, na ordem em que aparecem na ficha
    pub fn active_labels(&self) -> Vec<&'static str> {
        [
            (self.hypertensive, "Hipertenso"),
            (self.diabetic, "Diabético"),
            (self.pregnant, "Gestante"),
            (self.bedridden, "Acamado"),
            (self.smoker, "Fumante"),
            (self.home_bound, "Domiciliado"),
            (self.disabled, "Pessoa com deficiência"),
            (self.mental_health, "Saúde mental"),
        ]
        .into_iter()
        .filter_map(|(active, label)| active.then_some(label))
        .collect()
    }
}

/// Campos editáveis de um paciente
///
/// Tudo o que o formulário pode alterar; `id` e as datas de controle
/// ficam de fora e são geridos pelo backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientFields {
    /// Nome completo (obrigatório)
    pub name: String,
    /// Cartão Nacional de Saúde
    pub cns: Option<String>,
    /// CPF
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub mother_name: Option<String>,
    pub phone: Option<String>,
    pub address: Address,
    #[serde(default)]
    pub social: SocialProfile,
    #[serde(default)]
    pub markers: HealthMarkers,
    /// Observações livres do agente
    pub notes: Option<String>,
}

/// Ficha completa de um paciente
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    /// Identificador único, imutável após a criação
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: PatientFields,
    /// Data e hora de criação do registro
    pub created_at: DateTime<Utc>,
    /// Data e hora da última atualização
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// Cria uma nova ficha com id e datas gerados agora
    pub fn new(fields: PatientFields) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Substitui os campos editáveis mantendo `id` e `created_at`
    pub fn apply_update(&mut self, fields: PatientFields) {
        self.fields = fields;
        self.updated_at = Utc::now().max(self.created_at);
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn micro_area(&self) -> Option<&str> {
        self.fields.address.micro_area.as_deref()
    }
}
