//! Canned caregiving content: menu features, diet plans, medication
//! suggestions and daily routines.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{CareError, Notifier, ReminderEntry, Result};

/// Fallback when no diet plan exists for a condition
pub const DIET_FALLBACK: &str = "Please consult a dietitian for a personalized meal plan.";

/// Features offered by the assistant's menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    Dashboard,
    Calendar,
    MedicationReminder,
    DietRecommendations,
    DailyRoutines,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::Dashboard,
        Feature::MedicationReminder,
        Feature::DietRecommendations,
        Feature::Calendar,
        Feature::DailyRoutines,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Feature::Dashboard => "Dashboard",
            Feature::Calendar => "Calendar",
            Feature::MedicationReminder => "Medication Reminder",
            Feature::DietRecommendations => "Diet Recommendations",
            Feature::DailyRoutines => "Daily Routines",
        }
    }

    /// Spoken when the user enters the feature
    pub fn intro(self) -> &'static str {
        match self {
            Feature::Dashboard => {
                "Welcome to CareVox! Let’s make your day smoother, one request at a time."
            }
            Feature::Calendar => "You are in the Calendar section. Manage your appointments here.",
            Feature::MedicationReminder => {
                "You are in the Medication Reminder section. Please provide the required details."
            }
            Feature::DietRecommendations => {
                "You are in the Diet Recommendations section. Please provide the required details."
            }
            Feature::DailyRoutines => {
                "You are in the Daily Routines section. Here are your scheduled activities."
            }
        }
    }
}

static DIET_PLANS: [(&str, &str); 6] = [
    ("Diabetes", "Eat whole grains, lean proteins, green leafy vegetables, and avoid processed sugar."),
    ("Hypertension", "Reduce salt intake, eat potassium-rich foods like bananas, oranges, and leafy greens."),
    ("Heart Disease", "Eat omega-3 rich foods like salmon, nuts, and fiber-rich fruits & vegetables."),
    ("Kidney Disease", "Limit sodium, potassium, and phosphorus intake. Stay hydrated and avoid processed foods."),
    ("Arthritis", "Consume anti-inflammatory foods like turmeric, ginger, berries, and fatty fish."),
    ("Osteoporosis", "Increase calcium and vitamin D intake with dairy, leafy greens, and fortified foods."),
];

static MEDICATIONS: [(&str, &str); 7] = [
    ("Diabetes", "Metformin or Insulin"),
    ("Hypertension", "Lisinopril or Amlodipine"),
    ("Asthma", "Albuterol or Montelukast"),
    ("Cholesterol", "Atorvastatin or Simvastatin"),
    ("Depression", "Sertraline or Fluoxetine"),
    ("Arthritis", "Ibuprofen or Naproxen"),
    ("No Chronic Condition", "No specific medication required"),
];

fn lookup(table: &[(&'static str, &'static str)], condition: &str) -> Option<(&'static str, &'static str)> {
    let wanted = condition.trim();
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
        .copied()
}

/// Conditions with a diet plan
pub fn diet_conditions() -> impl Iterator<Item = &'static str> {
    DIET_PLANS.iter().map(|(name, _)| *name)
}

/// Conditions with a medication suggestion
pub fn medication_conditions() -> impl Iterator<Item = &'static str> {
    MEDICATIONS.iter().map(|(name, _)| *name)
}

/// Diet recommendation for `condition`, or [`DIET_FALLBACK`] when unknown
pub fn diet_plan(condition: &str) -> &'static str {
    lookup(&DIET_PLANS, condition)
        .map(|(_, plan)| plan)
        .unwrap_or(DIET_FALLBACK)
}

pub fn medication_suggestion(condition: &str) -> Result<&'static str> {
    lookup(&MEDICATIONS, condition)
        .map(|(_, medication)| medication)
        .ok_or_else(|| CareError::UnknownCondition {
            condition: condition.to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adherence {
    Likely,
    Unlikely,
}

impl Adherence {
    pub fn describe(self) -> &'static str {
        match self {
            Adherence::Likely => "Likely to adhere",
            Adherence::Unlikely => "Unlikely to adhere",
        }
    }
}

/// Threshold rule: adherence is likely when past adherence is above 0.6
/// and the activity level above 30.
pub fn predict_adherence(past_adherence: f64, activity_level: u32) -> Result<Adherence> {
    if !(0.0..=1.0).contains(&past_adherence) {
        return Err(CareError::Validation {
            field: "past adherence between 0 and 1".to_string(),
        });
    }
    if !(1..=100).contains(&activity_level) {
        return Err(CareError::Validation {
            field: "activity level between 1 and 100".to_string(),
        });
    }

    if past_adherence > 0.6 && activity_level > 30 {
        Ok(Adherence::Likely)
    } else {
        Ok(Adherence::Unlikely)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Routine {
    Morning,
    Afternoon,
    Evening,
}

impl Routine {
    pub fn name(self) -> &'static str {
        match self {
            Routine::Morning => "Morning Routine",
            Routine::Afternoon => "Afternoon Routine",
            Routine::Evening => "Evening Routine",
        }
    }

    pub fn activities(self) -> &'static [&'static str] {
        match self {
            Routine::Morning => &[
                "7:00 AM - Take morning medications",
                "7:30 AM - Check blood pressure",
                "8:00 AM - Drink water",
                "8:30 AM - Eat breakfast",
            ],
            Routine::Afternoon => &[
                "12:00 PM - Light exercise",
                "12:30 PM - Have lunch",
                "2:00 PM - Take afternoon medications",
                "3:00 PM - Hydration check",
            ],
            Routine::Evening => &[
                "6:00 PM - Prepare dinner",
                "7:00 PM - Evening walk",
                "8:00 PM - Take evening medications",
                "9:00 PM - Prepare for bed",
            ],
        }
    }
}

/// Reads a routine aloud: an opening line, then each activity
pub fn play_routine(routine: Routine, notifier: &dyn Notifier) {
    notifier.notify(&format!("Starting {}. Here are your tasks.", routine.name()));
    for activity in routine.activities() {
        notifier.notify(activity);
    }
}

/// Hydration, meal and medication reminders announced through the day
pub fn default_health_alerts() -> Vec<ReminderEntry> {
    [
        ("08:00 AM", "It's time to drink water. Stay hydrated!"),
        ("11:00 AM", "Mid-morning hydration reminder. Have a glass of water."),
        ("02:00 PM", "Afternoon hydration break. Drink some water."),
        ("05:00 PM", "Evening hydration time. Keep yourself well-hydrated."),
        ("07:30 AM", "Good morning! Time for a nutritious breakfast."),
        ("12:30 PM", "Lunchtime! Enjoy a balanced meal."),
        ("06:30 PM", "Dinner time. Have a pleasant evening meal."),
        ("07:00 AM", "Morning medication time. Take your prescribed medicines."),
        ("02:00 PM", "Afternoon medication reminder."),
        ("08:00 PM", "Evening medications. Follow your health plan."),
    ]
    .into_iter()
    .map(|(time, message)| ReminderEntry::new(time, message))
    .collect()
}
