//! Synthetic commerce-style products for demo data.

use rand::seq::SliceRandom;
use rand::Rng;

use super::domain::CreateProductDto;

const ADJECTIVES: &[&str] = &[
    "Small", "Ergonomic", "Rustic", "Intelligent", "Gorgeous", "Incredible", "Fantastic",
    "Practical", "Sleek", "Awesome", "Generic", "Handcrafted", "Handmade", "Licensed",
    "Refined", "Unbranded", "Tasty", "Modern", "Elegant", "Luxurious",
];

const MATERIALS: &[&str] = &[
    "Steel", "Wooden", "Concrete", "Plastic", "Cotton", "Granite", "Rubber", "Metal",
    "Soft", "Fresh", "Frozen", "Bronze", "Marble", "Silk",
];

const PRODUCTS: &[&str] = &[
    "Chair", "Car", "Computer", "Keyboard", "Mouse", "Bike", "Ball", "Gloves", "Pants",
    "Shirt", "Table", "Shoes", "Hat", "Towels", "Soap", "Tuna", "Chicken", "Fish",
    "Cheese", "Bacon", "Pizza", "Salad", "Sausages", "Chips",
];

const DESCRIPTIONS: &[&str] = &[
    "Ergonomic executive chair upholstered in bonded black leather and PVC padded seat and back for all-day comfort and support",
    "The automobile layout consists of a front-engine design, with transaxle-type transmissions mounted at the rear of the engine and four wheel drive",
    "New ABC 13 9370, 13.3, 5th Gen CoreA5-8250U, 8GB RAM, 256GB SSD, power UHD Graphics, OS 10 Home, OS Office A & J 2016",
    "The slim & simple Maple Gaming Keyboard from Dev Byte comes with a sleek body and 7- Color RGB LED Back-lighting for smart functionality",
    "The Apollotech B340 is an affordable wireless mouse with reliable connectivity, 12 months battery life and modern design",
    "The Nagasaki Lander is the trademarked name of several series of Nagasaki sport bikes, that started with the 1984 ABC800J",
    "The Football Is Good For Training And Recreational Purposes",
    "Carbonite web goalkeeper gloves are ergonomically designed to give easy fit",
    "Boston's most advanced compression wear technology increases muscle oxygenation, stabilizes active muscles",
    "New range of formal shirts are designed keeping you in mind. With fits and styling that will make you stand apart",
    "The beautiful range of Apple Naturale that has an exciting mix of natural ingredients. With the Goodness of 100% Natural Ingredients",
    "Andy shoes are designed to keeping in mind durability as well as trends, the most stylish range of shoes & sandals",
];

pub const MIN_PRICE: f64 = 1.0;
pub const MAX_PRICE: f64 = 1000.0;
pub const MIN_STOCK: i32 = 1;
pub const MAX_STOCK: i32 = 20;

/// Generates demo products from a caller-provided RNG.
pub struct DemoProducts<R> {
    rng: R,
}

impl<R: Rng> DemoProducts<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn product_name(&mut self) -> String {
        let pick = |rng: &mut R, words: &[&'static str]| words.choose(rng).copied().unwrap_or_default();
        format!(
            "{} {} {}",
            pick(&mut self.rng, ADJECTIVES),
            pick(&mut self.rng, MATERIALS),
            pick(&mut self.rng, PRODUCTS)
        )
    }

    /// Price in `[MIN_PRICE, MAX_PRICE]`, rounded to cents.
    pub fn price(&mut self) -> f64 {
        let cents = self.rng.gen_range((MIN_PRICE * 100.0) as u32..=(MAX_PRICE * 100.0) as u32);
        f64::from(cents) / 100.0
    }

    pub fn stock(&mut self) -> i32 {
        self.rng.gen_range(MIN_STOCK..=MAX_STOCK)
    }

    pub fn description(&mut self) -> String {
        DESCRIPTIONS.choose(&mut self.rng).copied().unwrap_or_default().to_string()
    }

    pub fn next_product(&mut self) -> CreateProductDto {
        CreateProductDto {
            name: self.product_name(),
            price: self.price(),
            stock: self.stock(),
            description: self.description(),
        }
    }
}
