// Copyright 2017 ThetaSinner
//
// This file is part of Ebb.

// Ebb is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Ebb is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Ebb.  If not, see <http://www.gnu.org/licenses/>.

// std
use std::time::Duration;

/// Limits on the lifetime of a single connection.
///
/// Each limit is optional, a limit which is not set is disabled and no timer is created for it.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    max_idle_time: Option<Duration>,
    max_age: Option<Duration>,
    max_grace_time: Option<Duration>
}

impl ConnectionSettings {
    /// Create a default settings
    ///
    /// By default every limit is disabled, so a connection lives until the client closes it or
    /// the server is quiesced.
    pub fn default() -> Self {
        ConnectionSettings {
            max_idle_time: None,
            max_age: None,
            max_grace_time: None
        }
    }

    /// How long a connection may go without any open streams before it is drained.
    pub fn get_max_idle_time(&self) -> Option<Duration> {
        self.max_idle_time
    }

    pub fn set_max_idle_time(&mut self, max_idle_time: Duration) {
        self.max_idle_time = Some(max_idle_time);
    }

    /// How long a connection may exist, busy or not, before it is drained.
    pub fn get_max_age(&self) -> Option<Duration> {
        self.max_age
    }

    pub fn set_max_age(&mut self, max_age: Duration) {
        self.max_age = Some(max_age);
    }

    /// How long a draining connection is given to finish its streams before it is closed outright.
    pub fn get_max_grace_time(&self) -> Option<Duration> {
        self.max_grace_time
    }

    pub fn set_max_grace_time(&mut self, max_grace_time: Duration) {
        self.max_grace_time = Some(max_grace_time);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ConnectionSettings;

    #[test]
    fn limits_disabled_by_default() {
        let settings = ConnectionSettings::default();

        assert_eq!(None, settings.get_max_idle_time());
        assert_eq!(None, settings.get_max_age());
        assert_eq!(None, settings.get_max_grace_time());
    }

    #[test]
    fn set_limits() {
        let mut settings = ConnectionSettings::default();
        settings.set_max_idle_time(Duration::from_secs(30));
        settings.set_max_grace_time(Duration::from_secs(5));

        assert_eq!(Some(Duration::from_secs(30)), settings.get_max_idle_time());
        assert_eq!(None, settings.get_max_age());
        assert_eq!(Some(Duration::from_secs(5)), settings.get_max_grace_time());
    }
}
