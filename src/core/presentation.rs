//! Display metadata for agents.

use crate::core::agent::AgentId;

/// Icon tag for an agent; the terminal renders it as [`AgentIcon::glyph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentIcon {
    ChartBar,
    Database,
    Search,
    ChartLine,
}

impl AgentIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            AgentIcon::ChartBar => "▥",
            AgentIcon::Database => "◫",
            AgentIcon::Search => "⌕",
            AgentIcon::ChartLine => "◆",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentPersona {
    pub label: &'static str,
    pub icon: AgentIcon,
    pub description: &'static str,
}

impl AgentPersona {
    pub fn glyph(&self) -> &'static str {
        self.icon.glyph()
    }

    /// `◫ Database Agent`
    pub fn badge(&self) -> String {
        format!("{} {}", self.glyph(), self.label)
    }
}

const VISUALIZATION: AgentPersona = AgentPersona {
    label: "Visualization Agent",
    icon: AgentIcon::ChartBar,
    description: "Building a chart from the data",
};

const DATABASE: AgentPersona = AgentPersona {
    label: "Database Agent",
    icon: AgentIcon::Database,
    description: "Querying the financial database",
};

const SEARCH: AgentPersona = AgentPersona {
    label: "Search Agent",
    icon: AgentIcon::Search,
    description: "Searching the web for the latest news",
};

const GENERAL: AgentPersona = AgentPersona {
    label: "Financi Agent",
    icon: AgentIcon::ChartLine,
    description: "Working on your question",
};

/// Conversation and unrecognised agents share the general persona.
pub fn persona_for(agent: &AgentId) -> AgentPersona {
    match agent {
        AgentId::Visualize => VISUALIZATION,
        AgentId::DatabaseQuery => DATABASE,
        AgentId::GoogleSearch => SEARCH,
        AgentId::Conversation | AgentId::Other(_) => GENERAL,
    }
}

/// Every persona with the agent it stands for, in `/agents` listing order.
pub fn known_personas() -> [(AgentId, AgentPersona); 4] {
    [
        (AgentId::Conversation, GENERAL),
        (AgentId::DatabaseQuery, DATABASE),
        (AgentId::GoogleSearch, SEARCH),
        (AgentId::Visualize, VISUALIZATION),
    ]
}
