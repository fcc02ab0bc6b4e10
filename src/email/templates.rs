const BUTTON_STYLE: &str = "display: inline-block; padding: 10px 20px; background: #16a34a; color: white; text-decoration: none; border-radius: 4px;";

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>{title}</h2>
{body}
    <p style="color: #666; font-size: 14px;">Equipe ISA 2.5</p>
</body>
</html>"#
    )
}

/// Minimal escaping for values interpolated into mail bodies.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_password_reset(reset_url: &str) -> String {
    layout(
        "Redefinição de senha",
        &format!(
            r#"    <p>Recebemos um pedido para redefinir a senha da sua conta ISA.</p>
    <p><a href="{url}" style="{BUTTON_STYLE}">Redefinir senha</a></p>
    <p style="color: #666; font-size: 14px;">O link expira em 1 hora. Se não foi você, ignore este e-mail.</p>"#,
            url = escape(reset_url),
        ),
    )
}

pub fn render_request_received(name: &str, matricula: &str) -> String {
    layout(
        "Solicitação recebida",
        &format!(
            r#"    <p>Olá {name},</p>
    <p>Recebemos sua solicitação de cadastro. Sua matrícula é <strong>{matricula}</strong>.</p>
    <p>Você será avisado por e-mail assim que a análise for concluída.</p>"#,
            name = escape(name),
            matricula = escape(matricula),
        ),
    )
}

pub fn render_request_approved(name: &str, matricula: &str, login_url: &str) -> String {
    layout(
        "Conta aprovada",
        &format!(
            r#"    <p>Olá {name},</p>
    <p>Sua conta foi aprovada. Acesse o painel com a matrícula <strong>{matricula}</strong>.</p>
    <p>No primeiro acesso, a senha é o seu CPF (somente números).</p>
    <p><a href="{url}" style="{BUTTON_STYLE}">Entrar no painel</a></p>"#,
            name = escape(name),
            matricula = escape(matricula),
            url = escape(login_url),
        ),
    )
}

pub fn render_request_rejected(name: &str, reason: Option<&str>) -> String {
    let reason = reason
        .map(|r| format!("    <p>Motivo: {}</p>\n", escape(r)))
        .unwrap_or_default();
    layout(
        "Solicitação não aprovada",
        &format!(
            r#"    <p>Olá {name},</p>
    <p>Infelizmente sua solicitação de cadastro não foi aprovada.</p>
{reason}    <p>Em caso de dúvidas, responda este e-mail.</p>"#,
            name = escape(name),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_mentions_matricula_and_cpf_hint() {
        let html = render_request_approved("Ana", "123456", "https://isa.example/login");
        assert!(html.contains("123456"));
        assert!(html.contains("CPF"));
        assert!(html.contains("https://isa.example/login"));
    }

    #[test]
    fn names_are_escaped() {
        let html = render_request_received("<b>Ana</b>", "123456");
        assert!(html.contains("&lt;b&gt;Ana&lt;/b&gt;"));
        assert!(!html.contains("<b>Ana</b>"));
    }

    #[test]
    fn rejection_reason_is_optional() {
        assert!(render_request_rejected("Ana", Some("CPF inválido")).contains("Motivo: CPF inválido"));
        assert!(!render_request_rejected("Ana", None).contains("Motivo"));
    }
}
