//! # Demo Complaints
//!
//! Hand-written complaints in Russian, Kazakh and a mix of both, covering
//! every extractor at least once. Used by the CLI `demo` command and by
//! tests.

/// `(title, text)` pairs.
pub fn demo_texts() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Опоздание",
            "Маршрут 12 опоздал на 40 минут, утром ждали на остановке Сарыарка в 08:30. Интервал не соблюдается.",
        ),
        (
            "Кешігу",
            "Сарыарқа аялдамасына 09:10 уақытында 37 бағыт келмеді, ұзақ күттік.",
        ),
        (
            "Грубость",
            "Жүргізуші нагрубил пассажирам и кричал на пенсионеров, автобус 128, Астана.",
        ),
        (
            "Контролёр",
            "Контролёр в автобусе был груб, оштрафовал без причины, хотя валидатор не работал.",
        ),
        (
            "Толы автобус",
            "Кешке 45 автобус лық толы, адам өте көп, Алматы, Сайран аялдамасында сыймай қалдық.",
        ),
        (
            "Безопасность",
            "Водитель гнал на красный, резко тормозил, чуть не было аварии у остановки Ақсай.",
        ),
        (
            "Оқу-жаттығу",
            "Жоспарлы оқу-жаттығу кезінде автобус тоқтап тұрды, жолаушылар түсірілді.",
        ),
        (
            "Состояние салона",
            "В автобусе №7 грязно, сиденья сломаны, кондиционер не работает, жарко.",
        ),
    ]
}
