use askama::Template;
use axum::extract::Query;
use axum::response::{Html, IntoResponse};
use serde::Deserialize;

pub const PLAN_PRICE: &str = "R$ 97/mês";

const FEATURES: [(&str, &str); 6] = [
    ("Atendimento 24/7", "A IA responde seus clientes no WhatsApp a qualquer hora."),
    ("Painel completo", "Métricas, conversas e clientes em um só lugar."),
    ("Memória IA", "Ensine a IA sobre sua empresa, produtos e políticas."),
    ("Atendimento humano", "Assuma a conversa quando o cliente pedir."),
    ("Suporte prioritário", "Equipe técnica pronta para ajudar."),
    ("Sem taxa de instalação", "Aprovação rápida e acesso em minutos."),
];

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    price: &'static str,
    features: &'static [(&'static str, &'static str)],
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    reset_token: Option<String>,
}

#[derive(Template)]
#[template(path = "cadastro.html")]
struct SignupTemplate {
    price: &'static str,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub reset_token: Option<String>,
}

pub async fn index() -> impl IntoResponse {
    let template = IndexTemplate {
        price: PLAN_PRICE,
        features: &FEATURES,
    };
    Html(template.render().unwrap_or_default())
}

/// Matricula sign-in. A `reset_token` in the query switches to the new-password form.
pub async fn login(Query(q): Query<LoginQuery>) -> impl IntoResponse {
    let template = LoginTemplate {
        reset_token: q.reset_token.filter(|t| !t.is_empty()),
    };
    Html(template.render().unwrap_or_default())
}

pub async fn signup() -> impl IntoResponse {
    let template = SignupTemplate { price: PLAN_PRICE };
    Html(template.render().unwrap_or_default())
}
