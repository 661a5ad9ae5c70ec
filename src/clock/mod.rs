use chrono::{Datelike, Timelike};

use crate::dom::{Document, ElementId};

const WEEKDAYS: [&str; 7] = [
    "Domingo", "Segunda", "Terça", "Quarta", "Quinta", "Sexta", "Sábado",
];

const MONTHS: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// `"Segunda, 5 de Janeiro · 09:03:07"`
pub fn format_clock<T: Datelike + Timelike>(t: &T) -> String {
    let weekday = WEEKDAYS[t.weekday().num_days_from_sunday() as usize];
    let month = MONTHS[t.month0() as usize];
    format!(
        "{}, {} de {} · {:02}:{:02}:{:02}",
        weekday,
        t.day(),
        month,
        t.hour(),
        t.minute(),
        t.second()
    )
}

#[derive(Debug)]
pub struct LiveClock {
    el: ElementId,
}

impl LiveClock {
    pub fn install<D: Document>(doc: &D) -> Option<Self> {
        doc.element_by_id("hero-datetime").map(|el| Self { el })
    }

    pub fn update<D: Document, T: Datelike + Timelike>(&self, doc: &mut D, now: &T) {
        doc.set_text(self.el, &format_clock(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Page;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(hh, mm, ss))
            .expect("valid instant")
    }

    #[test]
    fn formats_known_instant() {
        // 2024-01-01 was a Monday.
        assert_eq!(
            format_clock(&at(2024, 1, 1, 9, 3, 7)),
            "Segunda, 1 de Janeiro · 09:03:07"
        );
    }

    #[test]
    fn uses_accented_names() {
        // 2025-03-08 was a Saturday.
        assert_eq!(
            format_clock(&at(2025, 3, 8, 23, 59, 59)),
            "Sábado, 8 de Março · 23:59:59"
        );
    }

    #[test]
    fn sunday_is_first_and_midnight_is_padded() {
        // 2026-10-18 is a Sunday.
        assert_eq!(
            format_clock(&at(2026, 10, 18, 0, 0, 0)),
            "Domingo, 18 de Outubro · 00:00:00"
        );
    }

    #[test]
    fn update_writes_text() {
        let mut page = Page::new(800.0, 600.0);
        let body = page.body();
        let el = page.append(body, "span").id("hero-datetime").build();
        let clock = LiveClock::install(&page).expect("present");
        clock.update(&mut page, &at(2024, 12, 25, 18, 30, 5));
        assert_eq!(
            page.text(el).as_deref(),
            Some("Quarta, 25 de Dezembro · 18:30:05")
        );
    }

    #[test]
    fn missing_element_disables() {
        let page = Page::new(800.0, 600.0);
        assert!(LiveClock::install(&page).is_none());
    }
}
