//! Páginas HTML renderizadas no servidor

use std::fmt::Write;

use axum::response::Html;
use registro_db::Patient;
use uuid::Uuid;

use crate::forms::{PatientForm, CHECKBOXES};

/// Para onde o formulário de paciente envia os dados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    Create,
    Edit(Uuid),
}

impl FormTarget {
    fn action(&self) -> String {
        match self {
            FormTarget::Create => "/cadastro".to_string(),
            FormTarget::Edit(id) => format!("/editar/{id}"),
        }
    }

    fn title(&self) -> &'static str {
        match self {
            FormTarget::Create => "Novo paciente",
            FormTarget::Edit(_) => "Editar paciente",
        }
    }
}

/// Escapa texto para uso em conteúdo e atributos HTML
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn opt(value: Option<&str>) -> String {
    value.map(escape).unwrap_or_else(|| "—".to_string())
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title} · Registro ACS</title>\n<link rel=\"stylesheet\" href=\"/style.css\">\n\
         </head>\n<body>\n<header><a href=\"/\">Registro ACS</a></header>\n<main>\n{body}</main>\n</body>\n</html>\n",
        title = escape(title),
    ))
}

/// Listagem com busca
pub fn index(patients: &[Patient], search: &str) -> Html<String> {
    let mut body = String::new();
    let _ = write!(
        body,
        "<h1>Pacientes</h1>\n<form method=\"get\" action=\"/\">\
         <input type=\"search\" name=\"search\" value=\"{}\" placeholder=\"Nome, CNS ou CPF\">\
         <button type=\"submit\">Buscar</button></form>\n\
         <p><a href=\"/cadastro\">Cadastrar paciente</a></p>\n",
        escape(search)
    );

    if patients.is_empty() {
        body.push_str("<p class=\"empty\">Nenhum paciente encontrado.</p>\n");
        return layout("Pacientes", &body);
    }

    body.push_str(
        "<table>\n<thead><tr><th>Microárea</th><th>Nome</th><th>CNS</th><th>Marcadores</th></tr></thead>\n<tbody>\n",
    );
    for patient in patients {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td><a href=\"/paciente/{}\">{}</a></td><td>{}</td><td>{}</td></tr>",
            opt(patient.micro_area()),
            patient.id,
            escape(patient.name()),
            opt(patient.fields.cns.as_deref()),
            escape(&patient.fields.markers.active_labels().join(", ")),
        );
    }
    body.push_str("</tbody>\n</table>\n");
    layout("Pacientes", &body)
}

fn text_input(out: &mut String, label: &str, name: &str, value: Option<&str>, kind: &str) {
    let _ = writeln!(
        out,
        "<label>{label}<input type=\"{kind}\" name=\"{name}\" value=\"{}\"></label>",
        value.map(escape).unwrap_or_default(),
    );
}

/// Formulário de cadastro ou edição
pub fn patient_form(target: FormTarget, form: &PatientForm, errors: &[String]) -> Html<String> {
    let mut body = format!("<h1>{}</h1>\n", target.title());

    if !errors.is_empty() {
        body.push_str("<ul class=\"errors\">\n");
        for message in errors {
            let _ = writeln!(body, "<li>{}</li>", escape(message));
        }
        body.push_str("</ul>\n");
    }

    let _ = writeln!(body, "<form method=\"post\" action=\"{}\">", target.action());

    body.push_str("<fieldset><legend>Identificação</legend>\n");
    text_input(&mut body, "Nome", "nome", form.name.as_deref(), "text");
    text_input(&mut body, "CNS", "cns", form.cns.as_deref(), "text");
    text_input(&mut body, "CPF", "cpf", form.cpf.as_deref(), "text");
    text_input(&mut body, "Data de nascimento", "dataNascimento", form.birth_date.as_deref(), "date");
    text_input(&mut body, "Nome da mãe", "nomeMae", form.mother_name.as_deref(), "text");
    text_input(&mut body, "Telefone", "telefone", form.phone.as_deref(), "tel");
    body.push_str("</fieldset>\n<fieldset><legend>Endereço</legend>\n");
    text_input(&mut body, "Logradouro", "endereco", form.street.as_deref(), "text");
    text_input(&mut body, "Número", "numero", form.number.as_deref(), "text");
    text_input(&mut body, "Bairro", "bairro", form.neighborhood.as_deref(), "text");
    text_input(&mut body, "CEP", "cep", form.postal_code.as_deref(), "text");
    text_input(&mut body, "Microárea", "microarea", form.micro_area.as_deref(), "text");
    text_input(&mut body, "Ficha familiar", "familiaId", form.family_record.as_deref(), "text");
    body.push_str("</fieldset>\n<fieldset><legend>Dados sociodemográficos</legend>\n");
    text_input(&mut body, "Escolaridade", "escolaridade", form.education.as_deref(), "text");
    text_input(&mut body, "Ocupação", "ocupacao", form.occupation.as_deref(), "text");
    text_input(&mut body, "Situação de trabalho", "situacaoTrabalho", form.employment_status.as_deref(), "text");
    body.push_str("</fieldset>\n<fieldset><legend>Benefícios e condições de saúde</legend>\n");
    for (name, label) in CHECKBOXES {
        let checked = if form.is_checked(name) { " checked" } else { "" };
        let _ = writeln!(
            body,
            "<label><input type=\"checkbox\" name=\"{name}\"{checked}> {label}</label>"
        );
    }
    let _ = write!(
        body,
        "</fieldset>\n<label>Observações<textarea name=\"observacoes\">{}</textarea></label>\n\
         <button type=\"submit\">Salvar</button>\n</form>\n",
        form.notes.as_deref().map(escape).unwrap_or_default(),
    );

    layout(target.title(), &body)
}

/// Ficha do paciente
pub fn details(patient: &Patient) -> Html<String> {
    let f = &patient.fields;
    let mut body = format!("<h1>{}</h1>\n<dl>\n", escape(&f.name));

    let birth_date = f.birth_date.map(|d| d.format("%d/%m/%Y").to_string());
    let benefits: Vec<&str> = [(f.social.bolsa_familia, "Bolsa Família"), (f.social.bpc, "BPC")]
        .into_iter()
        .filter_map(|(on, label)| on.then_some(label))
        .collect();
    let benefits = benefits.join(", ");
    let markers = f.markers.active_labels().join(", ");

    let rows: [(&str, String); 19] = [
        ("CNS", opt(f.cns.as_deref())),
        ("CPF", opt(f.cpf.as_deref())),
        ("Data de nascimento", opt(birth_date.as_deref())),
        ("Nome da mãe", opt(f.mother_name.as_deref())),
        ("Telefone", opt(f.phone.as_deref())),
        ("Logradouro", escape(&f.address.street)),
        ("Número", opt(f.address.number.as_deref())),
        ("Bairro", opt(f.address.neighborhood.as_deref())),
        ("CEP", opt(f.address.postal_code.as_deref())),
        ("Microárea", opt(f.address.micro_area.as_deref())),
        ("Ficha familiar", opt(f.address.family_record.as_deref())),
        ("Escolaridade", opt(f.social.education.as_deref())),
        ("Ocupação", opt(f.social.occupation.as_deref())),
        ("Situação de trabalho", opt(f.social.employment_status.as_deref())),
        ("Benefícios", opt(Some(benefits.as_str()).filter(|s| !s.is_empty()))),
        ("Marcadores", opt(Some(markers.as_str()).filter(|s| !s.is_empty()))),
        ("Observações", opt(f.notes.as_deref())),
        ("Cadastrado em", patient.created_at.format("%d/%m/%Y %H:%M").to_string()),
        ("Atualizado em", patient.updated_at.format("%d/%m/%Y %H:%M").to_string()),
    ];
    for (label, value) in rows {
        let _ = writeln!(body, "<dt>{label}</dt><dd>{value}</dd>");
    }

    let _ = write!(
        body,
        "</dl>\n<p><a href=\"/editar/{id}\">Editar</a></p>\n\
         <form method=\"post\" action=\"/delete/{id}\">\
         <button type=\"submit\">Excluir</button></form>\n",
        id = patient.id,
    );
    layout(&f.name, &body)
}

/// Página genérica para falhas internas; nunca expõe detalhes
pub fn error_page() -> Html<String> {
    layout(
        "Erro",
        "<h1>Algo deu errado</h1>\n<p>Não foi possível concluir a operação. Tente novamente.</p>\n\
         <p><a href=\"/\">Voltar para a lista</a></p>\n",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use registro_db::{Address, PatientFields};

    fn patient(name: &str) -> Patient {
        Patient::new(PatientFields {
            name: name.to_string(),
            address: Address {
                street: "Rua 1".to_string(),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[test]
    fn escape_handles_markup() {
        assert_eq!(
            escape("<b>\"Zé\" & 'Ana'</b>"),
            "&lt;b&gt;&quot;Zé&quot; &amp; &#39;Ana&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn index_escapes_names_and_links_details() {
        let p = patient("<script>");
        let Html(html) = index(std::slice::from_ref(&p), "");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(&format!("/paciente/{}", p.id)));
    }

    #[test]
    fn empty_index_says_so() {
        let Html(html) = index(&[], "ninguem");
        assert!(html.contains("Nenhum paciente encontrado"));
        assert!(html.contains("value=\"ninguem\""));
    }

    #[test]
    fn edit_form_posts_to_the_patient() {
        let id = Uuid::new_v4();
        let Html(html) = patient_form(FormTarget::Edit(id), &PatientForm::default(), &[]);
        assert!(html.contains(&format!("action=\"/editar/{id}\"")));
    }

    #[test]
    fn details_shows_markers_and_actions() {
        let mut p = patient("Zuleide");
        p.fields.markers.pregnant = true;
        let Html(html) = details(&p);
        assert!(html.contains("Gestante"));
        assert!(html.contains(&format!("/delete/{}", p.id)));
    }
}
