#![allow(dead_code)]

use serde_json::{Value, json};
use telly_model::ShowPayload;

pub fn payload(value: Value) -> ShowPayload {
    serde_json::from_value(value).unwrap()
}

/// Two seasons, shared people across episodes, a duplicated crew entry and a
/// network whose country is unknown.
pub fn breaking_bad() -> Value {
    json!({
        "id": 1396,
        "name": "Breaking Bad",
        "original_name": "Breaking Bad",
        "first_air_date": "2008-01-20",
        "last_air_date": "2013-09-29",
        "status": "Ended",
        "type": "Scripted",
        "popularity": 288.459,
        "vote_average": 8.9,
        "vote_count": 12000,
        "in_production": false,
        "episode_run_time": [45, 47],
        "languages": ["en"],
        "genres": [
            {"id": 18, "name": "Drama"},
            {"id": 80, "name": "Crime"},
            {"id": 18, "name": "Dramatic"}
        ],
        "networks": [
            {"id": 174, "name": "AMC", "logo_path": "/amc.png", "origin_country": "us"},
            {"id": 175, "name": "Elsewhere TV", "origin_country": "ZZ"}
        ],
        "created_by": [
            {"id": 66633, "name": "Vince Gilligan", "credit_id": "52542282760ee313280017f9", "gender": 2}
        ],
        "production_companies": [
            {"id": 11073, "name": "Sony Pictures Television Studios", "origin_country": "US"}
        ],
        "production_countries": [
            {"iso_3166_1": "US", "name": "United States of America"}
        ],
        "origin_country": ["US", "ZZ"],
        "spoken_languages": [
            {"iso_639_1": "en", "name": "English", "english_name": "English"},
            {"iso_639_1": "es", "name": "Español", "english_name": "Spanish"}
        ],
        "seasons": [
            {
                "id": 3573,
                "season_number": 2,
                "name": "Season 2",
                "air_date": "2009-03-08",
                "episodes": [
                    {"id": 62092, "episode_number": 1, "name": "Seven Thirty-Seven",
                     "crew": [{"id": 29779, "name": "Michelle MacLaren", "job": "Director"}],
                     "guest_stars": []}
                ]
            },
            {
                "id": 3572,
                "season_number": 1,
                "name": "Season 1",
                "air_date": "2008-01-20",
                "episodes": [
                    {"id": 62086, "episode_number": 2, "name": "Cat's in the Bag...",
                     "crew": [{"id": 29779, "name": "Michelle MacLaren", "job": "Director"}],
                     "guest_stars": []},
                    {"id": 62085, "episode_number": 1, "name": "Pilot",
                     "crew": [
                         {"id": 66633, "name": "Vince Gilligan", "job": "Director"},
                         {"id": 66633, "name": "Vince Gilligan", "job": "Writer"},
                         {"id": 29779, "name": "Michelle MacLaren", "job": "Producer"}
                     ],
                     "guest_stars": [
                         {"id": 92495, "name": "John Koyama", "popularity": 1.2},
                         {"id": 92495, "name": "John Koyama"}
                     ]},
                    {"id": 62087, "episode_number": 3, "name": "...And the Bag's in the River",
                     "crew": [], "guest_stars": []}
                ]
            }
        ]
    })
}

/// A second show sharing the network, creator and crew of [`breaking_bad`].
pub fn better_call_saul() -> Value {
    json!({
        "id": 60059,
        "name": "Better Call Saul",
        "popularity": 120.5,
        "genres": [{"id": 80, "name": "Crime"}],
        "networks": [{"id": 174, "name": "AMC", "origin_country": "US"}],
        "created_by": [{"id": 66633, "name": "Vince Gilligan"}],
        "production_countries": [{"iso_3166_1": "US", "name": "United States of America"}],
        "seasons": [
            {
                "id": 60223,
                "season_number": 1,
                "episodes": [
                    {"id": 1051277, "episode_number": 1, "name": "Uno",
                     "crew": [
                         {"id": 66633, "name": "Vince Gilligan", "job": "Director"},
                         {"id": 29779, "name": "Michelle MacLaren", "job": "Producer"}
                     ]}
                ]
            }
        ]
    })
}
