//! Built-in command tables
//!
//! Every language declares the same action set. Trigger phrases overlap in
//! places (`rewards` appears under both `SHOW_REWARDS` and `VIEW_REWARDS`);
//! the earlier rule wins.

use crate::language::Language;

use super::rules::{Action, CommandRule, CommandTable};

/// The built-in table for a language
pub fn builtin_table(language: Language) -> CommandTable {
    let rules = match language {
        Language::En => english(),
        Language::Es => spanish(),
        Language::De => german(),
        Language::Mr => marathi(),
        Language::Hi => hindi(),
    };
    CommandTable { language, rules }
}

fn english() -> Vec<CommandRule> {
    use Action::*;
    vec![
        CommandRule::new(AddMoney, &["add money", "deposit", "save money"], "Add money to savings"),
        CommandRule::new(CreateGoal, &["create goal", "set goal", "new goal"], "Create savings goal"),
        CommandRule::new(CheckBalance, &["check balance", "show balance", "my savings"], "Check current balance"),
        CommandRule::new(ShowRewards, &["show rewards", "my rewards", "points"], "Show reward points"),
        CommandRule::new(OpenSettings, &["open settings", "settings", "preferences"], "Open settings"),
        CommandRule::new(GoDashboard, &["dashboard", "home", "main"], "Go to dashboard"),
        CommandRule::new(ShowCharts, &["show charts", "charts", "analytics", "graphs"], "Show/hide charts"),
        CommandRule::new(ShowHelp, &["help", "commands", "what can i say"], "Show voice commands"),
        CommandRule::new(Logout, &["logout", "sign out", "exit"], "Sign out"),
        CommandRule::new(SavingsShopping, &["savings shopping", "shopping savings", "round up"], "Open savings via shopping"),
        CommandRule::new(MyTransactions, &["my transactions", "transactions", "transaction history"], "View transaction history"),
        CommandRule::new(ViewRewards, &["view rewards", "my rewards", "rewards"], "View rewards and points"),
        CommandRule::new(GoBack, &["go back", "back"], "Go back"),
    ]
}

fn spanish() -> Vec<CommandRule> {
    use Action::*;
    vec![
        CommandRule::new(AddMoney, &["agregar dinero", "depositar", "ahorrar dinero"], "Agregar dinero a ahorros"),
        CommandRule::new(CreateGoal, &["crear objetivo", "establecer objetivo", "nuevo objetivo"], "Crear objetivo de ahorro"),
        CommandRule::new(CheckBalance, &["verificar saldo", "mostrar saldo", "mis ahorros"], "Verificar saldo actual"),
        CommandRule::new(ShowRewards, &["mostrar recompensas", "mis recompensas", "puntos"], "Mostrar puntos de recompensa"),
        CommandRule::new(OpenSettings, &["abrir configuración", "configuración", "preferencias"], "Abrir configuración"),
        CommandRule::new(GoDashboard, &["panel", "inicio", "principal"], "Ir al panel"),
        CommandRule::new(ShowCharts, &["mostrar gráficos", "gráficos", "analíticas", "estadísticas"], "Mostrar/ocultar gráficos"),
        CommandRule::new(ShowHelp, &["ayuda", "comandos", "qué puedo decir"], "Mostrar comandos de voz"),
        CommandRule::new(Logout, &["cerrar sesión", "salir"], "Cerrar sesión"),
        CommandRule::new(SavingsShopping, &["ahorros comprando", "compras ahorros", "redondear"], "Abrir ahorros vía compras"),
        CommandRule::new(MyTransactions, &["mis transacciones", "transacciones", "historial de transacciones"], "Ver historial de transacciones"),
        CommandRule::new(ViewRewards, &["ver recompensas", "mis recompensas", "recompensas"], "Ver recompensas y puntos"),
        CommandRule::new(GoBack, &["volver", "regresar", "atrás"], "Volver"),
    ]
}

fn german() -> Vec<CommandRule> {
    use Action::*;
    vec![
        CommandRule::new(AddMoney, &["geld hinzufügen", "einzahlen", "geld sparen"], "Geld zu Ersparnissen hinzufügen"),
        CommandRule::new(CreateGoal, &["ziel erstellen", "ziel setzen", "neues ziel"], "Sparziel erstellen"),
        CommandRule::new(CheckBalance, &["guthaben prüfen", "guthaben zeigen", "meine ersparnisse"], "Aktuelles Guthaben prüfen"),
        CommandRule::new(ShowRewards, &["belohnungen zeigen", "meine belohnungen", "punkte"], "Belohnungspunkte zeigen"),
        CommandRule::new(OpenSettings, &["einstellungen öffnen", "einstellungen", "präferenzen"], "Einstellungen öffnen"),
        CommandRule::new(GoDashboard, &["dashboard", "startseite", "haupt"], "Zum Dashboard gehen"),
        CommandRule::new(ShowCharts, &["diagramme zeigen", "diagramme", "analytics", "statistiken"], "Diagramme anzeigen/verbergen"),
        CommandRule::new(ShowHelp, &["hilfe", "befehle", "was kann ich sagen"], "Sprachbefehle zeigen"),
        CommandRule::new(Logout, &["abmelden", "ausloggen"], "Abmelden"),
        CommandRule::new(SavingsShopping, &["sparen beim einkaufen", "einkaufs ersparnisse", "aufrunden"], "Sparen beim Einkaufen öffnen"),
        CommandRule::new(MyTransactions, &["meine transaktionen", "transaktionen", "transaktionshistorie"], "Transaktionshistorie anzeigen"),
        CommandRule::new(ViewRewards, &["belohnungen anzeigen", "meine belohnungen", "belohnungen"], "Belohnungen und Punkte anzeigen"),
        CommandRule::new(GoBack, &["zurück"], "Zurück"),
    ]
}

fn marathi() -> Vec<CommandRule> {
    use Action::*;
    vec![
        CommandRule::new(AddMoney, &["पैसे जोडा", "ठेव", "पैसे वाचवा"], "बचतीमध्ये पैसे जोडा"),
        CommandRule::new(CreateGoal, &["लक्ष्य तयार करा", "लक्ष्य सेट करा", "नवीन लक्ष्य"], "बचत लक्ष्य तयार करा"),
        CommandRule::new(CheckBalance, &["शिल्लक तपासा", "शिल्लक दाखवा", "माझी बचत"], "सध्याची शिल्लक तपासा"),
        CommandRule::new(ShowRewards, &["बक्षिसे दाखवा", "माझी बक्षिसे", "गुण"], "बक्षीस गुण दाखवा"),
        CommandRule::new(OpenSettings, &["सेटिंग्ज उघडा", "सेटिंग्ज", "प्राधान्ये"], "सेटिंग्ज उघडा"),
        CommandRule::new(GoDashboard, &["डॅशबोर्ड", "मुख्यपृष्ठ", "मुख्य"], "डॅशबोर्डवर जा"),
        CommandRule::new(ShowCharts, &["चार्ट दाखवा", "चार्ट", "आकडेवारी", "ग्राफ"], "चार्ट दाखवा/लपवा"),
        CommandRule::new(ShowHelp, &["मदत", "आदेश", "मी काय बोलू शकतो"], "आवाज आदेश दाखवा"),
        CommandRule::new(Logout, &["लॉग आउट", "बाहेर पडा"], "लॉग आउट करा"),
        CommandRule::new(SavingsShopping, &["खरेदीतून बचत", "शॉपिंग बचत", "राउंड अप"], "खरेदीतून बचत उघडा"),
        CommandRule::new(MyTransactions, &["माझे व्यवहार", "व्यवहार", "व्यवहार इतिहास"], "व्यवहार इतिहास पहा"),
        CommandRule::new(ViewRewards, &["बक्षिसे पहा", "माझी बक्षिसे", "बक्षिसे"], "बक्षिसे आणि गुण पहा"),
        CommandRule::new(GoBack, &["मागे जा", "मागे"], "मागे जा"),
    ]
}

fn hindi() -> Vec<CommandRule> {
    use Action::*;
    vec![
        CommandRule::new(AddMoney, &["पैसे जोड़ें", "जमा करें", "पैसे बचाएं"], "बचत में पैसे जोड़ें"),
        CommandRule::new(CreateGoal, &["लक्ष्य बनाएं", "लक्ष्य सेट करें", "नया लक्ष्य"], "बचत लक्ष्य बनाएं"),
        CommandRule::new(CheckBalance, &["बैलेंस चेक करें", "बैलेंस दिखाएं", "मेरी बचत"], "वर्तमान बैलेंस चेक करें"),
        CommandRule::new(ShowRewards, &["रिवार्ड दिखाएं", "मेरे रिवार्ड", "पॉइंट्स"], "रिवार्ड पॉइंट्स दिखाएं"),
        CommandRule::new(OpenSettings, &["सेटिंग्स खोलें", "सेटिंग्स", "प्राथमिकताएं"], "सेटिंग्स खोलें"),
        CommandRule::new(GoDashboard, &["डैशबोर्ड", "होम", "मुख्य"], "डैशबोर्ड पर जाएं"),
        CommandRule::new(ShowCharts, &["चार्ट दिखाएं", "चार्ट", "आंकड़े", "ग्राफ"], "चार्ट दिखाएं/छुपाएं"),
        CommandRule::new(ShowHelp, &["मदद", "कमांड्स", "मैं क्या कह सकता हूं"], "वॉयस कमांड्स दिखाएं"),
        CommandRule::new(Logout, &["लॉग आउट", "साइन आउट", "बाहर निकलें"], "साइन आउट करें"),
        CommandRule::new(SavingsShopping, &["शॉपिंग से बचत", "खरीदारी बचत", "राउंड अप"], "शॉपिंग से बचत खोलें"),
        CommandRule::new(MyTransactions, &["मेरे लेनदेन", "लेनदेन", "लेनदेन इतिहास"], "लेनदेन इतिहास देखें"),
        CommandRule::new(ViewRewards, &["रिवार्ड देखें", "मेरे रिवार्ड", "रिवार्ड"], "रिवार्ड और पॉइंट्स देखें"),
        CommandRule::new(GoBack, &["वापस जाएं", "वापस"], "वापस जाएं"),
    ]
}
