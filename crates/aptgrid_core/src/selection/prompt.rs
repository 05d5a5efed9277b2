//! Popup and main-button texts shown after a unit is selected.

use crate::selection::action::FALLBACK_AREA;
use crate::selection::Selection;

pub const RECEIPT_BUTTON_LABEL: &str = "📝 Создать квитанцию";
pub const CONTRACT_BUTTON_LABEL: &str = "✍️ Создать договор";
pub const NO_SELECTION_ALERT: &str = "❌ Сначала выберите квартиру!";

const FREE_UNIT_ROOMS: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPrompt {
    pub title: String,
    pub message: String,
    /// Label of the main button that starts the action.
    pub button_label: String,
}

pub fn prompt_for(selection: &Selection) -> UnitPrompt {
    let number = selection.unit.display_number();
    let title = format!("Квартира {number}");

    if selection.occupied {
        let area = selection.area.as_ref().map_or("—", |area| area.as_text());
        let lines = [
            format!("👤 Владелец: {}", selection.owner.as_deref().unwrap_or("—")),
            format!("📐 Площадь: {area} м²"),
            format!("🏢 Блок: {}", selection.block.as_deref().unwrap_or("—")),
            format!("📍 Квартира: {number}"),
        ];
        UnitPrompt {
            title,
            message: lines.join("\n"),
            button_label: RECEIPT_BUTTON_LABEL.to_string(),
        }
    } else {
        let lines = [
            format!("📍 Квартира: {number}"),
            format!("📐 Площадь: ~{FALLBACK_AREA} м²"),
            format!("🛏️ Комнат: {FREE_UNIT_ROOMS}"),
            format!("🏢 Этаж: {}", selection.unit.floor()),
            "✅ Статус: Свободна".to_string(),
        ];
        UnitPrompt {
            title,
            message: lines.join("\n"),
            button_label: CONTRACT_BUTTON_LABEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{prompt_for, CONTRACT_BUTTON_LABEL, RECEIPT_BUTTON_LABEL};
    use crate::model::unit::{Area, OccupancyRecord, Unit, UnitRef};
    use crate::selection::Selection;

    #[test]
    fn occupied_prompt_lists_owner_and_offers_receipt() {
        let selection = Selection::from(Unit::occupied(
            UnitRef::parse("3", 5).expect("3-5 should exist"),
            OccupancyRecord {
                owner: "Ivanov".to_string(),
                area: Some(Area::parse("54.2")),
                block: Some("A".to_string()),
                client_id: None,
            },
        ));
        let prompt = prompt_for(&selection);
        assert_eq!(prompt.title, "Квартира 3-5");
        assert!(prompt.message.contains("Ivanov"));
        assert!(prompt.message.contains("54.2 м²"));
        assert_eq!(prompt.button_label, RECEIPT_BUTTON_LABEL);
    }

    #[test]
    fn free_prompt_shows_nominal_area_and_offers_contract() {
        let selection = Selection::from(Unit::free(UnitRef::parse("ц.", 1).expect("ц.-1 should exist")));
        let prompt = prompt_for(&selection);
        assert!(prompt.message.contains("~40.71"));
        assert!(prompt.message.contains("Этаж: ц."));
        assert_eq!(prompt.button_label, CONTRACT_BUTTON_LABEL);
    }
}
