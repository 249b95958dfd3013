use crate::models::{Route, TransportType};

/// Built-in routes shown when the remote catalog is unavailable.
pub fn fallback_routes() -> Vec<Route> {
    vec![
        Route {
            id: 1,
            route: "Route 101".to_string(),
            kind: TransportType::Bus.label().to_string(),
            from: "Central Station".to_string(),
            to: "Airport Terminal".to_string(),
            duration: "45 mins".to_string(),
            price: "$5.50".to_string(),
            frequency: "Every 15 mins".to_string(),
            status: "Active".to_string(),
            image: "https://images.unsplash.com/photo-1570125909232-eb263c188f7e?w=400"
                .to_string(),
            description: "Express bus service connecting city center to airport with comfortable seating.".to_string(),
            operator: "City Transit".to_string(),
            schedule: times(&["6:00 AM", "6:15 AM", "6:30 AM", "6:45 AM"]),
        },
        Route {
            id: 2,
            route: "Blue Line".to_string(),
            kind: TransportType::Metro.label().to_string(),
            from: "Downtown".to_string(),
            to: "Suburbs East".to_string(),
            duration: "32 mins".to_string(),
            price: "$3.00".to_string(),
            frequency: "Every 8 mins".to_string(),
            status: "Active".to_string(),
            image: "https://images.unsplash.com/photo-1581262177000-8c89f0f95b63?w=400"
                .to_string(),
            description: "Modern metro line with air-conditioned coaches and WiFi connectivity."
                .to_string(),
            operator: "Metro Services".to_string(),
            schedule: times(&["5:30 AM", "5:38 AM", "5:46 AM", "5:54 AM"]),
        },
    ]
}

fn times(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
