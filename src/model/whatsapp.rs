use crate::model::backup::URI_COMPONENT;
use crate::model::lead::{CallOutcome, Lead, WebsiteStatus};
use percent_encoding::utf8_percent_encode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub website: String,
    pub country_code: String,
    /// Pricing block for interested leads; empty leaves it out.
    pub offer: String,
}

pub const DEFAULT_OFFER: &str = "👉 Pack 2 (Web + SEO local)\n\
     Precio normal: 1.290€\n\
     👉 Te lo dejamos al precio del Pack 1: 690€\n\n\
     Además, como parte de esta oferta, el SEO mensual básico lo dejamos en 90€/mes en lugar de 120€.\n\
     Es totalmente opcional, aunque suele ayudar mucho a acelerar resultados.";

/// Digits only; a bare 9-digit national mobile or landline (6, 7 or 9) gets
/// the country code.
pub fn normalize_phone(raw: &str, country_code: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 9 && digits.starts_with(['6', '7', '9']) {
        format!("{country_code}{digits}")
    } else {
        digits
    }
}

pub fn message(lead: &Lead, sender: &Sender) -> String {
    let me = &sender.name;
    let web = &sender.website;
    match lead.outcome {
        CallOutcome::Interested => {
            let offer = if sender.offer.trim().is_empty() {
                String::new()
            } else {
                format!("{}\n\n", sender.offer.trim())
            };
            format!(
                "Hola, soy {me}, encantado.\n\n\
                 Tal como te comenté por teléfono, ahora mismo estamos buscando casos de éxito \
                 en tu profesión para documentar resultados reales (visibilidad, contactos y reservas).\n\n\
                 {offer}\
                 A cambio, únicamente cuando la web esté funcionando y estés contento con el \
                 resultado, nos grabarías un breve vídeo-testimonio contando tu experiencia.\n\n\
                 Aquí puedes ver nuestra web:\n{web}\n\n\
                 No hace falta decidir nada ahora, míralo con calma."
            )
        }
        CallOutcome::NotNow => format!(
            "Hola, soy {me}.\n\n\
             Entiendo que ahora no sea el momento, sin problema 👍\n\
             Cuando más adelante te encaje retomarlo, lo vemos con calma y te explico cómo \
             podríamos trabajarlo para casos como el tuyo, sin compromiso."
        ),
        CallOutcome::AlreadyGotSomeone => format!(
            "Hola, soy {me}.\n\n\
             Genial 👍\n\
             En ese caso, si en algún momento quieres comparar resultados o una segunda opinión, \
             estaré encantado de ayudarte.\n\n\
             Te dejo nuestra web por si te sirve de referencia:\n👉 {web}"
        ),
        CallOutcome::FuturePotential => format!(
            "Hola, soy {me}.\n\n\
             Perfecto, tiene sentido 👍\n\
             Cuando estés en este punto, lo vemos con calma y te explico cómo solemos trabajar \
             con casos como el tuyo.\n\n\
             Te dejo mientras tanto la web para que nos tengas ubicados:\n👉 {web}"
        ),
        CallOutcome::Booked => {
            let date = lead
                .follow_up_date
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "[día]".to_string());
            let time = if lead.follow_up_time.is_empty() {
                "[hora]"
            } else {
                lead.follow_up_time.as_str()
            };
            format!(
                "Hola, soy {me}.\n\n\
                 Genial, entonces quedamos así 👍\n\
                 Nos vemos el {date} a las {time} y en la llamada te explico todo con ejemplos \
                 claros y cómo lo aplicaríamos a casos similares al tuyo.\n\n\
                 ¡Hablamos pronto!"
            )
        }
        CallOutcome::NoAnswer
        | CallOutcome::Gatekeeper
        | CallOutcome::CallLater
        | CallOutcome::NotInterestedHard => {
            let name = if lead.contact_name.is_empty() {
                "ahí"
            } else {
                lead.contact_name.as_str()
            };
            let business = if lead.business_name.is_empty() {
                "vuestro negocio"
            } else {
                lead.business_name.as_str()
            };
            let issue = match lead.website_status {
                WebsiteStatus::Broken | WebsiteStatus::Weak => "vuestra web",
                WebsiteStatus::No | WebsiteStatus::Good => "vuestra visibilidad en Google",
            };
            format!(
                "Hola {name}, soy {me}. Acabo de llamar a {business} por el tema de {issue} \
                 pero no he podido localizarte. ¿Hablamos cuando puedas?"
            )
        }
    }
}

/// `None` when the lead has no usable phone number.
pub fn link(lead: &Lead, sender: &Sender) -> Option<String> {
    let phone = normalize_phone(&lead.phone, &sender.country_code);
    if phone.is_empty() {
        return None;
    }
    let body = message(lead, sender);
    let text = utf8_percent_encode(&body, URI_COMPONENT);
    Some(format!("https://wa.me/{phone}?text={text}"))
}
