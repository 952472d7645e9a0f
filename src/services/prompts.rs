//! Prompt templates and response schemas for the story flows.
//!
//! Stories are written in Spanish for children, so every template is too.

use serde_json::{json, Value};

pub fn generate_story(theme: &str, character_name: &str, character_traits: &str) -> String {
    format!(
        "Eres un escritor experto en cuentos infantiles. Escribe un cuento corto y original \
         en español para niños de 4 a 10 años.\n\n\
         Tema: {theme}\n\
         Personaje principal: {character_name}\n\
         Rasgos del personaje: {character_traits}\n\n\
         El cuento debe tener un inicio, un desarrollo y un final feliz, usar un lenguaje \
         sencillo y transmitir una enseñanza positiva. Devuelve un título atractivo en \
         \"title\" y el texto completo del cuento en \"story\"."
    )
}

pub fn extend_story(existing_story: &str, continuation_prompt: &str) -> String {
    format!(
        "Eres un escritor de cuentos infantiles. Este es el cuento escrito hasta ahora:\n\n\
         {existing_story}\n\n\
         Continúa el cuento siguiendo esta indicación: {continuation_prompt}\n\n\
         La continuación debe mantener el tono, los personajes y el estilo, y no puede \
         contradecir nada de lo que ya ocurrió en el cuento. Escribe solo la nueva sección, \
         sin repetir el texto anterior, y devuélvela en \"continuation\"."
    )
}

pub fn illustrate_story(title: &str, theme: &str) -> String {
    format!(
        "Crea una ilustración colorida y amable para un cuento infantil titulado \"{title}\" \
         sobre el tema \"{theme}\". Estilo de libro ilustrado para niños, formas suaves, \
         sin texto dentro de la imagen."
    )
}

pub fn narrate_story(text: &str) -> String {
    format!("Lee este cuento infantil con una voz cálida, expresiva y pausada:\n\n{text}")
}

pub fn story_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "story": { "type": "STRING" }
        },
        "required": ["title", "story"]
    })
}

pub fn continuation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "continuation": { "type": "STRING" }
        },
        "required": ["continuation"]
    })
}
