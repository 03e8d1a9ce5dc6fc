//! Sidebar topics and their narrative text.

/// A narrative page selectable from the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// 房子越買越老？ House age and unit price per county.
    AgingHomes,
    /// 越來越晚買房？ Age of new mortgage applicants.
    LaterBuyers,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::AgingHomes, Topic::LaterBuyers];

    /// Sidebar label.
    pub fn label(&self) -> &'static str {
        match self {
            Topic::AgingHomes => "房子越買越老？",
            Topic::LaterBuyers => "越來越晚買房？",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Topic::AgingHomes => "Are homes bought getting older?",
            Topic::LaterBuyers => "Are people buying homes later?",
        }
    }

    pub fn intro(&self) -> &'static str {
        match self {
            Topic::AgingHomes => {
                "Each bubble is a county: average age of houses sold against the average \
                 contract unit price, per quarter since 2011Q1. Bubble size is the number of \
                 transactions. Most bubbles drift from the lower left to the upper right: \
                 buyers pay more and settle for older homes, while volumes shrink. \
                 Kinmen, Lienchiang and Penghu are excluded as outliers."
            }
            Topic::LaterBuyers => {
                "New mortgage applications per quarter and age bracket since 2009Q1. \
                 In 2009Q1 the 30-35 bracket applied most, followed by 35-40. By 2023Q1 \
                 30-35 had dropped to third place behind 40-45."
            }
        }
    }

    pub fn outro(&self) -> &'static str {
        match self {
            Topic::AgingHomes => {
                "House age rose almost everywhere, yet its growth correlates only loosely \
                 with price growth. Red bars grew faster than the national average, blue \
                 bars slower. Source: Ministry of the Interior real-estate information \
                 platform; contract prices from the Joint Credit Information Center."
            }
            Topic::LaterBuyers => {
                "Applications are not limited to first-time buyers, so part of the shift may \
                 come from more second purchases. Source: Joint Credit Information Center \
                 housing loan statistics."
            }
        }
    }
}
